//! Output module: the consumers around a run
//!
//! This module handles:
//! - Printing rendered results and writing them to the output file
//! - Printing probe errors
//! - The once-a-second progress line and clearing it before other output
//! - The startup banner and the `run` driver wiring all of it to the engine

mod runner;
mod terminal;

pub use runner::{run, RunSummary};
pub use terminal::Terminal;
