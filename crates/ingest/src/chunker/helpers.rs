//! Separator search over character windows.

/// Separators in priority order. A hard character cut is the implicit last
/// resort when none of these fits the window.
pub(crate) const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Position just past the last occurrence of `sep` in `window`, provided that
/// position is strictly greater than `min_cut`. Positions are character
/// offsets relative to the window start.
pub(crate) fn last_cut_after(window: &[char], sep: &[char], min_cut: usize) -> Option<usize> {
    if sep.is_empty() || sep.len() > window.len() {
        return None;
    }
    let mut i = window.len() - sep.len();
    loop {
        let cut = i + sep.len();
        if cut <= min_cut {
            return None;
        }
        if window[i..cut] == *sep {
            return Some(cut);
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    }
}

/// Best cut for a window: the highest-priority separator whose last
/// occurrence ends beyond `min_cut`; the full window length otherwise.
pub(crate) fn choose_cut(window: &[char], min_cut: usize) -> usize {
    for sep in SEPARATORS {
        let sep: Vec<char> = sep.chars().collect();
        if let Some(cut) = last_cut_after(window, &sep, min_cut) {
            return cut;
        }
    }
    window.len()
}
