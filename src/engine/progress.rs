//! Progress counters for a run
//!
//! Workers bump `completed` once per word; any thread can take a snapshot.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Completed/total counters updated atomically by the workers
#[derive(Debug, Default)]
pub struct Progress {
    completed: AtomicUsize,
    total: usize,
}

/// Point-in-time view of [`Progress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Records one finished word
    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            total: self.total,
        }
    }
}

impl ProgressSnapshot {
    /// Completion percentage, 100 for an empty run
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress: {} / {} ({:.2}%)",
            self.completed,
            self.total,
            self.percent()
        )
    }
}
