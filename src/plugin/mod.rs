//! Probing strategies
//!
//! A [`Plugin`] decides what to do with one candidate word. The engine only
//! knows this trait; the concrete strategies are:
//! - [`DirPlugin`] - HTTP path discovery through the probe client
//! - [`DnsPlugin`] - subdomain discovery through a DNS resolver

mod dir;
mod dns;

pub use dir::DirPlugin;
pub use dns::DnsPlugin;

use crate::client::ProbeClient;
use crate::config::{Mode, Options};
use crate::{BusterError, ProbeError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared handles a strategy probes with
///
/// Owned by the engine and lent to the strategy for every call.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    /// HTTP transport shared by all workers
    pub client: Arc<ProbeClient>,

    /// Cancellation signal of the run
    pub cancel: CancellationToken,
}

/// Successful outcome for one candidate word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// The candidate word
    pub word: String,

    /// What was probed, e.g. `/admin` or `admin.example.com`
    pub entity: String,

    /// Whether the strategy considers this a discovery
    pub hit: bool,

    /// Observed status classification (HTTP status code)
    pub status: Option<u16>,

    /// Response length, when reported
    pub size: Option<u64>,

    /// Extra metadata, e.g. resolved addresses
    pub extra: Option<String>,
}

/// A pluggable probing strategy
///
/// Implementations may issue any number of requests per word, but return
/// exactly one outcome for it.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Human readable name of the strategy
    fn name(&self) -> &'static str;

    /// Checks run once before any word is processed
    ///
    /// An error here aborts the run before workers start.
    async fn pre_run(&self, _ctx: &ProbeContext) -> Result<(), BusterError> {
        Ok(())
    }

    /// Probes one candidate word
    async fn process(&self, ctx: &ProbeContext, word: &str) -> Result<ProbeResult, ProbeError>;

    /// Renders a result as a display line, `None` when it shouldn't be shown
    fn result_to_string(&self, result: &ProbeResult) -> Option<String>;

    /// Renders the active configuration for the startup banner
    fn config_string(&self) -> String;
}

/// Builds the strategy selected by `options.mode`
///
/// # Returns
///
/// * `Ok(Arc<dyn Plugin>)` - The configured strategy
/// * `Err(BusterError)` - The strategy's transport couldn't be set up
pub fn from_options(options: &Options) -> Result<Arc<dyn Plugin>, BusterError> {
    let plugin: Arc<dyn Plugin> = match options.mode {
        Mode::Dir => Arc::new(DirPlugin::new(options)),
        Mode::Dns => Arc::new(DnsPlugin::new(options)?),
    };
    Ok(plugin)
}

/// Appends one `[+] key: value` banner line
pub(crate) fn config_line(out: &mut String, key: &str, value: impl std::fmt::Display) {
    out.push_str(&format!("[+] {:<16}{}\n", format!("{}:", key), value));
}
