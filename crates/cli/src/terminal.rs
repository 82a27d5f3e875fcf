use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wafrag_llm::Answer;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const ANSWER_TEXT: Color = Color::Cyan;
    const SOURCE: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const WARNING: Color = Color::DarkYellow;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Inputs that end the session, compared case-insensitively.
pub const EXIT_COMMANDS: [&str; 4] = ["quit", "exit", "q", "종료"];

pub const EXAMPLE_QUESTIONS: [&str; 4] = [
    "What are security best practices for ML models?",
    "How to optimize costs in generative AI workloads?",
    "What is operational excellence in cloud architecture?",
    "Compare traditional ML and generative AI security practices",
];

pub fn is_exit_command(input: &str) -> bool {
    let lowered = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&lowered.as_str())
}

/// One line read from the user.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Question(String),
    Empty,
    Exit,
}

impl Input {
    /// Classify a raw line; `None` means end of input.
    pub fn classify(line: Option<&str>) -> Self {
        match line {
            None => Input::Exit,
            Some(l) if is_exit_command(l) => Input::Exit,
            Some(l) if l.trim().is_empty() => Input::Empty,
            Some(l) => Input::Question(l.trim().to_string()),
        }
    }
}

/// Manages terminal I/O for the interactive loop.
#[derive(Debug, Default)]
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner with example questions.
    pub fn print_banner(&self, model: &str, chunks: usize) -> Result<()> {
        let mut stdout = io::stdout();
        let rule = "=".repeat(70);
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!("\n{rule}\n🤖 AWS Well-Architected Framework Chatbot\n{rule}\n")),
            SetForegroundColor(Colors::DIM),
            Print(format!("Model: {model} | Indexed chunks: {chunks}\n")),
            Print("Type 'quit', 'exit', 'q' or '종료' to end.\n"),
            ResetColor,
            Print("\n💡 Example Questions:\n"),
        )?;
        for q in EXAMPLE_QUESTIONS {
            execute!(stdout, Print(format!("  • {q}\n")))?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Prompt for and read one line of input.
    pub fn read_input(&self) -> Result<Input> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::USER_PROMPT),
            Print("🧑 Your Question: "),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok(Input::classify((read > 0).then_some(line.as_str())))
    }

    /// Print the answer followed by its numbered sources.
    pub fn display_answer(&self, answer: &Answer) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n💡 Answer:\n"),
            SetForegroundColor(Colors::ANSWER_TEXT),
            Print(format!("{}\n", answer.text)),
            ResetColor,
        )?;

        if !answer.sources.is_empty() {
            execute!(stdout, Print("\n📚 Sources:\n"))?;
        }
        for (idx, source) in answer.sources.iter().enumerate() {
            execute!(
                stdout,
                SetForegroundColor(Colors::SOURCE),
                Print(format!("\n  [{}] {}\n", idx + 1, source.label)),
                ResetColor,
                SetForegroundColor(Colors::DIM),
                Print(format!("      {}\n", source.origin)),
                Print(format!("      \"{}...\"\n", source.snippet)),
                ResetColor,
            )?;
        }
        execute!(stdout, Print(format!("\n{}\n", "-".repeat(70))))?;
        stdout.flush()?;
        Ok(())
    }

    /// Show a spinner/waiting indicator. Returns a handle to stop it.
    pub fn start_spinner(&self, message: &str) -> Result<SpinnerHandle> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{} ", message)),
            ResetColor,
        )?;
        stdout.flush()?;

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = std::thread::spawn(move || {
            let frames = ['|', '/', '-', '\\'];
            let mut i = 0;
            while running_clone.load(Ordering::SeqCst) {
                let mut stdout = io::stdout();
                execute!(
                    stdout,
                    SetForegroundColor(Colors::DIM),
                    Print(format!("\r{} ", frames[i % frames.len()])),
                    ResetColor,
                )
                .ok();
                stdout.flush().ok();
                i += 1;
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            let mut stdout = io::stdout();
            execute!(stdout, Print("\r  \r")).ok();
            stdout.flush().ok();
        });

        Ok(SpinnerHandle {
            running,
            thread: Some(handle),
        })
    }

    pub fn print_warning(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::WARNING),
            Print(format!("⚠️  {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an error with a remediation hint underneath.
    pub fn print_error(&self, msg: &str, hint: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ERROR),
            Print(format!("❌ Error: {}\n", msg)),
            ResetColor,
            SetForegroundColor(Colors::DIM),
            Print(format!("💡 Tip: {}\n", hint)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

/// Handle to a running spinner. Drop or call stop() to terminate it.
pub struct SpinnerHandle {
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SpinnerHandle {
    /// Stop the spinner and wait until its line is cleared.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

impl Drop for SpinnerHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
