//! Rustbuster main entry point
//!
//! This is the command-line interface for the Rustbuster discovery engine.

use clap::{Args, Parser, Subcommand};
use rustbuster::config::{
    load_options, parse_status_codes, prepare, DirOptions, DnsOptions, GeneralOptions, HttpOptions,
    Mode, Options,
};
use rustbuster::wordlist::FileWordlist;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Rustbuster: concurrent content discovery
///
/// Rustbuster probes a target once per word of a wordlist, either as URL
/// paths of a web server or as subdomains of a DNS zone, and prints what
/// it finds as it goes.
#[derive(Parser, Debug)]
#[command(name = "rustbuster")]
#[command(version)]
#[command(about = "Concurrent directory and subdomain discovery", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover directories and files on a web server
    Dir(DirArgs),

    /// Discover subdomains of a DNS zone
    Dns(DnsArgs),

    /// Run with options read from a TOML file
    Run {
        /// Path to TOML options file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
}

/// Flags shared by every mode
#[derive(Args, Debug)]
struct GeneralArgs {
    /// Path to the wordlist
    #[arg(short, long)]
    wordlist: PathBuf,

    /// Number of concurrent workers
    #[arg(short, long, default_value_t = 10)]
    threads: usize,

    /// Write results to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Don't print the banner, progress or errors
    #[arg(short, long)]
    quiet: bool,

    /// Don't display progress
    #[arg(short = 'z', long)]
    no_progress: bool,

    /// Force processing when the target answers for non existing entries
    #[arg(long)]
    wildcard: bool,
}

#[derive(Args, Debug)]
struct DirArgs {
    #[command(flatten)]
    general: GeneralArgs,

    /// The target URL
    #[arg(short, long)]
    url: String,

    /// Cookies to use for the requests
    #[arg(short, long)]
    cookies: Option<String>,

    /// Set the User-Agent string
    #[arg(short = 'a', long)]
    useragent: Option<String>,

    /// Username for basic auth
    #[arg(short = 'U', long)]
    username: Option<String>,

    /// Password for basic auth
    #[arg(short = 'P', long)]
    password: Option<String>,

    /// Proxy to use for requests [http(s)://host:port]
    #[arg(short, long)]
    proxy: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Follow redirects
    #[arg(short = 'r', long)]
    follow_redirect: bool,

    /// Include the length of the body in the output
    #[arg(short = 'l', long)]
    include_length: bool,

    /// Positive status codes
    #[arg(short, long, default_value = "200,204,301,302,307,401,403")]
    status_codes: String,

    /// Print full URLs
    #[arg(short, long)]
    expanded: bool,

    /// Don't print status codes
    #[arg(short, long)]
    no_status: bool,
}

#[derive(Args, Debug)]
struct DnsArgs {
    #[command(flatten)]
    general: GeneralArgs,

    /// The target domain
    #[arg(short, long)]
    domain: String,

    /// Use a custom DNS server (ip or ip:port)
    #[arg(short = 'R', long)]
    resolver: Option<String>,

    /// Show IP addresses
    #[arg(short = 'i', long)]
    show_ips: bool,

    /// DNS resolver timeout in seconds
    #[arg(long, default_value_t = 1)]
    timeout: u64,
}

impl From<GeneralArgs> for GeneralOptions {
    fn from(args: GeneralArgs) -> Self {
        Self {
            threads: args.threads,
            wordlist: args.wordlist,
            output: args.output,
            quiet: args.quiet,
            no_progress: args.no_progress,
            wildcard: args.wildcard,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = build_options(cli.command)?;

    // Setup logging based on verbosity
    setup_logging(cli.verbose, options.general.quiet);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Keyboard interrupt detected, terminating.");
            interrupt.cancel();
        }
    });

    let source = FileWordlist::open(&options.general.wordlist).await?;
    let plugin = rustbuster::plugin::from_options(&options)?;

    match rustbuster::output::run(cancel, &options, plugin, Arc::new(source)).await {
        Ok(summary) => {
            tracing::debug!(
                "{} results ({} shown), {} errors",
                summary.results,
                summary.hits,
                summary.errors
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Maps the selected subcommand onto validated options
fn build_options(command: Command) -> anyhow::Result<Options> {
    let options = match command {
        Command::Run { config } => return Ok(load_options(&config)?),
        Command::Dir(args) => Options {
            mode: Mode::Dir,
            general: args.general.into(),
            http: HttpOptions {
                url: args.url,
                timeout: args.timeout,
                proxy: args.proxy,
                insecure_tls: args.insecure,
                follow_redirect: args.follow_redirect,
                username: args.username,
                password: args.password,
                cookies: args.cookies,
                user_agent: args.useragent,
                include_length: args.include_length,
            },
            dir: DirOptions {
                status_codes: parse_status_codes(&args.status_codes)?,
                expanded: args.expanded,
                no_status: args.no_status,
            },
            dns: DnsOptions::default(),
        },
        Command::Dns(args) => Options {
            mode: Mode::Dns,
            general: args.general.into(),
            http: HttpOptions::default(),
            dir: DirOptions::default(),
            dns: DnsOptions {
                domain: args.domain,
                resolver: args.resolver,
                show_ips: args.show_ips,
                timeout: args.timeout,
            },
        },
    };

    Ok(prepare(options)?)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries the results only.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rustbuster=warn"),
            1 => EnvFilter::new("rustbuster=info,warn"),
            2 => EnvFilter::new("rustbuster=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
