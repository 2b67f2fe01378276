use crate::engine::ProgressSnapshot;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

/// Carriage return followed by "erase line"
const RESET_LINE: &str = "\r\x1b[2K";

/// Serializes writes to the terminal
///
/// The progress line is drawn on stderr without a newline, so anything else
/// printed while it's shown has to erase it first.
#[derive(Debug, Default)]
pub struct Terminal {
    progress_shown: Mutex<bool>,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        match self.progress_shown.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn erase(shown: &mut bool) {
        if *shown {
            eprint!("{}", RESET_LINE);
            *shown = false;
        }
    }

    /// Redraws the progress line
    pub fn print_progress(&self, snapshot: ProgressSnapshot) {
        let mut shown = self.lock();
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "{}{}", RESET_LINE, snapshot);
        let _ = stderr.flush();
        *shown = true;
    }

    /// Erases the progress line if it is shown
    pub fn clear_progress(&self) {
        let mut shown = self.lock();
        Self::erase(&mut shown);
    }

    /// Runs `f` with the progress line erased
    pub fn with_cleared<F: FnOnce()>(&self, f: F) {
        let mut shown = self.lock();
        Self::erase(&mut shown);
        f();
    }

    /// Prints one result line on stdout
    pub fn print_line(&self, line: &str) {
        self.with_cleared(|| println!("{}", line));
    }
}
