use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent workers
pub const DEFAULT_THREADS: usize = 10;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default per-lookup DNS timeout in seconds
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 1;

/// Status codes reported by the dir strategy unless configured otherwise
pub const DEFAULT_STATUS_CODES: [u16; 7] = [200, 204, 301, 302, 307, 401, 403];

/// Which strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// HTTP path discovery
    Dir,
    /// DNS subdomain discovery
    Dns,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dir => "dir",
            Self::Dns => "dns",
        }
    }
}

/// Main configuration structure for a run
///
/// Built once (from CLI flags or a TOML file), validated, and then shared
/// read-only by the engine and the strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct Options {
    pub mode: Mode,
    #[serde(default)]
    pub general: GeneralOptions,
    #[serde(default)]
    pub http: HttpOptions,
    #[serde(default)]
    pub dir: DirOptions,
    #[serde(default)]
    pub dns: DnsOptions,
}

/// Options shared by every strategy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneralOptions {
    /// Number of concurrent workers
    pub threads: usize,

    /// Path to the wordlist
    pub wordlist: PathBuf,

    /// File that rendered results are written to
    pub output: Option<PathBuf>,

    /// Don't print the banner, progress or errors
    pub quiet: bool,

    /// Don't display progress
    pub no_progress: bool,

    /// Keep going when the target answers for non existing entries
    pub wildcard: bool,
}

impl Default for GeneralOptions {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            wordlist: PathBuf::new(),
            output: None,
            quiet: false,
            no_progress: false,
            wildcard: false,
        }
    }
}

/// HTTP transport configuration for the probe client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpOptions {
    /// Target base URL
    pub url: String,

    /// Per-request timeout in seconds
    pub timeout: u64,

    /// Proxy all requests through this URL
    pub proxy: Option<String>,

    /// Skip TLS certificate verification
    pub insecure_tls: bool,

    /// Follow redirects instead of reporting them
    pub follow_redirect: bool,

    /// Username for basic auth
    pub username: Option<String>,

    /// Password for basic auth
    pub password: Option<String>,

    /// Raw value of the Cookie header
    pub cookies: Option<String>,

    /// User-Agent override
    pub user_agent: Option<String>,

    /// Report the response length
    pub include_length: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            proxy: None,
            insecure_tls: false,
            follow_redirect: false,
            username: None,
            password: None,
            cookies: None,
            user_agent: None,
            include_length: false,
        }
    }
}

impl HttpOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Options specific to the dir strategy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DirOptions {
    /// Status codes that count as a hit
    pub status_codes: Vec<u16>,

    /// Print full URLs instead of paths
    pub expanded: bool,

    /// Don't print status codes
    pub no_status: bool,
}

impl Default for DirOptions {
    fn default() -> Self {
        Self {
            status_codes: DEFAULT_STATUS_CODES.to_vec(),
            expanded: false,
            no_status: false,
        }
    }
}

/// Options specific to the dns strategy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DnsOptions {
    /// Base domain to enumerate
    pub domain: String,

    /// Custom resolver, `ip` or `ip:port`
    pub resolver: Option<String>,

    /// Show the addresses a name resolves to
    pub show_ips: bool,

    /// Per-lookup timeout in seconds
    pub timeout: u64,
}

impl Default for DnsOptions {
    fn default() -> Self {
        Self {
            domain: String::new(),
            resolver: None,
            show_ips: false,
            timeout: DEFAULT_DNS_TIMEOUT_SECS,
        }
    }
}

impl DnsOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
