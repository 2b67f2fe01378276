//! Run driver
//!
//! Wires the external consumers around an [`Engine`]: one task per output
//! channel, a progress ticker, and the banner before and after the run.

use crate::config::Options;
use crate::engine::{Engine, Progress};
use crate::output::Terminal;
use crate::plugin::{Plugin, ProbeResult};
use crate::wordlist::WordSource;
use crate::{BusterError, ProbeError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const RULER: &str = "=====================================================";

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Counts collected by the consumers of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Results received, rendered or not
    pub results: usize,

    /// Results the strategy rendered as a discovery
    pub hits: usize,

    /// Probe errors received
    pub errors: usize,
}

/// Runs a complete discovery
///
/// This is the main entry point behind the CLI. It will:
/// 1. Build the engine (validating options and the HTTP client)
/// 2. Print the banner and configuration unless quiet
/// 3. Spawn the result, error and progress consumers
/// 4. Run the engine until the wordlist is drained or `cancel` fires
/// 5. Wait for the consumers and print the closing banner
///
/// # Arguments
///
/// * `cancel` - Cancellation signal of the run
/// * `options` - Validated run options
/// * `plugin` - The strategy to apply
/// * `source` - The candidate words
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run completed or was cancelled
/// * `Err(BusterError)` - Setup failed; nothing or only part of the
///   wordlist was processed
pub async fn run(
    cancel: CancellationToken,
    options: &Options,
    plugin: Arc<dyn Plugin>,
    source: Arc<dyn WordSource>,
) -> Result<RunSummary, BusterError> {
    let quiet = options.general.quiet;
    let engine = Engine::new(cancel.clone(), options, plugin, source)?;

    let output = match &options.general.output {
        Some(path) => Some(create_output(path).await?),
        None => None,
    };

    if !quiet {
        println!();
        println!("{}", RULER);
        println!("{}", banner());
        println!("{}", RULER);
        println!("{}", engine.config_string());
        println!("{}", RULER);
        println!("{} Starting rustbuster", timestamp());
        println!("{}", RULER);
    }

    let results = engine.take_results().ok_or(BusterError::AlreadyStarted)?;
    let errors = engine.take_errors().ok_or(BusterError::AlreadyStarted)?;
    let terminal = Arc::new(Terminal::new());

    let result_task = tokio::spawn(result_worker(
        engine.plugin().clone(),
        results,
        output,
        terminal.clone(),
    ));
    let error_task = tokio::spawn(error_worker(errors, quiet, terminal.clone()));

    let ticker = cancel.child_token();
    let progress_task = if !quiet && !options.general.no_progress {
        Some(tokio::spawn(progress_worker(
            ticker.clone(),
            engine.progress_handle(),
            terminal.clone(),
        )))
    } else {
        None
    };

    let outcome = engine.start().await;

    // stops the ticker; the other consumers end when their channel closes
    ticker.cancel();

    let (results, hits) = join_consumer(result_task).await;
    let errors = join_consumer(error_task).await;
    if let Some(task) = progress_task {
        join_consumer(task).await;
    }

    if !quiet {
        terminal.clear_progress();
        println!("{}", RULER);
        println!("{} Finished", timestamp());
        println!("{}", RULER);
    }

    outcome?;

    Ok(RunSummary {
        results,
        hits,
        errors,
    })
}

fn banner() -> String {
    format!("Rustbuster v{}", env!("CARGO_PKG_VERSION"))
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
}

async fn create_output(path: &Path) -> Result<BufWriter<File>, BusterError> {
    let file = File::create(path).await.map_err(|e| {
        tracing::error!("Error creating output file {}: {}", path.display(), e);
        BusterError::Io(e)
    })?;
    Ok(BufWriter::new(file))
}

async fn join_consumer<T: Default>(task: JoinHandle<T>) -> T {
    match task.await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Output task failed: {}", e);
            T::default()
        }
    }
}

/// Prints and records rendered results until the channel closes
///
/// Ranges over the channel without looking at the cancellation signal, so
/// the engine always has a receiver. A failing output file is logged and
/// dropped; printing goes on.
///
/// # Returns
///
/// `(results received, results rendered)`
async fn result_worker(
    plugin: Arc<dyn Plugin>,
    mut results: UnboundedReceiver<ProbeResult>,
    mut output: Option<BufWriter<File>>,
    terminal: Arc<Terminal>,
) -> (usize, usize) {
    let mut received = 0;
    let mut rendered = 0;

    while let Some(result) = results.recv().await {
        received += 1;

        let line = match plugin.result_to_string(&result) {
            Some(line) => line.trim().to_string(),
            None => continue,
        };
        if line.is_empty() {
            continue;
        }
        rendered += 1;

        terminal.print_line(&line);

        if let Some(file) = output.as_mut() {
            if let Err(e) = file.write_all(format!("{}\n", line).as_bytes()).await {
                tracing::error!("Unable to write to output file: {}", e);
                output = None;
            }
        }
    }

    if let Some(mut file) = output {
        if let Err(e) = file.flush().await {
            tracing::error!("Unable to flush output file: {}", e);
        }
    }

    (received, rendered)
}

/// Logs probe errors until the channel closes
async fn error_worker(
    mut errors: UnboundedReceiver<ProbeError>,
    quiet: bool,
    terminal: Arc<Terminal>,
) -> usize {
    let mut received = 0;

    while let Some(error) = errors.recv().await {
        received += 1;
        if !quiet {
            terminal.with_cleared(|| tracing::warn!("[!] {}", error));
        }
    }

    received
}

/// Redraws the progress line every tick until `stop` fires
async fn progress_worker(stop: CancellationToken, progress: Arc<Progress>, terminal: Arc<Terminal>) {
    let mut tick = tokio::time::interval(PROGRESS_INTERVAL);
    // the first tick completes immediately
    tick.tick().await;

    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = tick.tick() => terminal.print_progress(progress.snapshot()),
        }
    }
}
