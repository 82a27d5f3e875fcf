//! Recursive character chunking engine.
//!
//! Splits loaded documents into overlapping, size-bounded chunks suitable for
//! embedding. Cuts prefer paragraph breaks, then line breaks, sentence ends and
//! spaces, falling back to a hard character cut. Sizes are counted in Unicode
//! scalar values.

mod helpers;
mod splitter;
mod types;

pub use splitter::{ChunkError, Chunker};
pub use types::{Chunk, ChunkConfig};
