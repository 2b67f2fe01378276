//! Configuration module for Rustbuster
//!
//! This module handles the run [`Options`]: the TOML file format, loading and
//! validation. CLI flags are mapped onto the same types by the binary and go
//! through the same validation.
//!
//! # Example
//!
//! ```no_run
//! use rustbuster::config::load_options;
//! use std::path::Path;
//!
//! let options = load_options(Path::new("scan.toml")).unwrap();
//! println!("Running with {} threads", options.general.threads);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{DirOptions, DnsOptions, GeneralOptions, HttpOptions, Mode, Options};

// Re-export parser functions
pub use parser::{load_options, parse_options, parse_status_codes};
pub use validation::{parse_resolver, prepare, validate};
