//! Rustbuster: a concurrent content-discovery engine
//!
//! This crate probes a target once per candidate word (HTTP paths, DNS
//! subdomains) with a bounded pool of workers, classifies each probe and
//! streams the outcomes to consumers as they arrive.

pub mod client;
pub mod config;
pub mod engine;
pub mod output;
pub mod plugin;
pub mod wordlist;

use thiserror::Error;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("rustbuster/", env!("CARGO_PKG_VERSION"));

/// Main error type for run-level failures
///
/// Only configuration and setup problems surface here. Failures of a single
/// probe are reported as [`ProbeError`] values on the engine's error channel.
#[derive(Debug, Error)]
pub enum BusterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to connect to {url}: {source}")]
    Unreachable { url: String, source: ClientError },

    #[error(
        "the server returns a status code that matches the provided options for non existing urls. \
         {url} => {status}. To force processing of wildcard responses, specify the '--wildcard' switch"
    )]
    WildcardUrl { url: String, status: u16 },

    #[error(
        "the DNS server returns results for non existing subdomains. {name} => {addresses}. \
         To force processing of wildcard responses, specify the '--wildcard' switch"
    )]
    WildcardDns { name: String, addresses: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Resolver error: {0}")]
    Resolver(String),

    #[error("Wordlist error for {path}: {source}")]
    Wordlist {
        path: String,
        source: std::io::Error,
    },

    #[error("Engine has already been started")]
    AlreadyStarted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failure of a single network request
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid certificate")]
    InvalidCertificate,

    #[error("request cancelled")]
    Cancelled,

    #[error("{source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("lookup of {name} failed: {message}")]
    Resolve { name: String, message: String },
}

impl ClientError {
    /// Returns true if the request ran into the configured timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request { source, .. } if source.is_timeout())
    }
}

/// Failed outcome for one candidate word
///
/// Published on the engine's error channel; never fatal to the run.
#[derive(Debug, Error)]
#[error("error on word {word}: {source}")]
pub struct ProbeError {
    pub word: String,
    #[source]
    pub source: ClientError,
}

impl ProbeError {
    pub fn new(word: impl Into<String>, source: ClientError) -> Self {
        Self {
            word: word.into(),
            source,
        }
    }
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, BusterError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for single requests
pub type ClientResult<T> = std::result::Result<T, ClientError>;

// Re-export commonly used types
pub use client::{ProbeClient, ProbeResponse};
pub use config::Options;
pub use engine::{Engine, EngineState, Progress, ProgressSnapshot};
pub use plugin::{Plugin, ProbeContext, ProbeResult};
pub use wordlist::{FileWordlist, MemoryWordlist, WordSource};
