//! Dispatch engine
//!
//! This module contains the concurrency core of a run:
//! - A fixed pool of workers draining the word source
//! - One strategy call and exactly one published outcome per word
//! - Cancellation and channel shutdown
//! - Progress counters readable while the run is going

mod dispatcher;
mod progress;

pub use dispatcher::{Engine, EngineState};
pub use progress::{Progress, ProgressSnapshot};
