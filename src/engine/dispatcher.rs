//! Worker pool that drains the word source
//!
//! The engine spawns a fixed number of workers. Each one pulls a word, hands
//! it to the strategy and publishes exactly one outcome on the results or
//! errors channel. Both channels close once every worker has returned, on
//! normal exhaustion and on cancellation alike.

use crate::client::ProbeClient;
use crate::config::{validate, Options};
use crate::engine::progress::{Progress, ProgressSnapshot};
use crate::plugin::{config_line, Plugin, ProbeContext, ProbeResult};
use crate::wordlist::WordSource;
use crate::{BusterError, ProbeError};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Lifecycle of an [`Engine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    /// Constructed, `start` not called yet
    Created = 0,
    /// Workers are pulling words
    Running = 1,
    /// The word source is exhausted, in-flight probes are finishing
    Draining = 2,
    /// All workers returned and the channels are closed
    Stopped = 3,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// Sending halves of the output channels, handed to the workers on start
struct Senders {
    results: UnboundedSender<ProbeResult>,
    errors: UnboundedSender<ProbeError>,
}

/// Takes the value out of a slot, ignoring lock poisoning
fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

/// The dispatch engine
///
/// Consumers must take both receivers and drain them until they close. The
/// channels are unbounded, so workers never wait on a slow consumer.
pub struct Engine {
    threads: usize,
    wordlist: String,
    plugin: Arc<dyn Plugin>,
    source: Arc<dyn WordSource>,
    ctx: ProbeContext,
    progress: Arc<Progress>,
    state: Arc<AtomicU8>,
    senders: Mutex<Option<Senders>>,
    results: Mutex<Option<UnboundedReceiver<ProbeResult>>>,
    errors: Mutex<Option<UnboundedReceiver<ProbeError>>>,
}

impl Engine {
    /// Creates a new engine
    ///
    /// # Arguments
    ///
    /// * `cancel` - Cancellation signal of the run
    /// * `options` - Run options, validated here once
    /// * `plugin` - The strategy applied to every word
    /// * `source` - Where the candidate words come from
    ///
    /// # Returns
    ///
    /// * `Ok(Engine)` - Engine in the `Created` state
    /// * `Err(BusterError)` - Invalid options or HTTP client setup failure
    pub fn new(
        cancel: CancellationToken,
        options: &Options,
        plugin: Arc<dyn Plugin>,
        source: Arc<dyn WordSource>,
    ) -> Result<Self, BusterError> {
        validate(options)?;

        let client = ProbeClient::new(&options.http, cancel.clone())?;
        let (results_tx, results_rx) = unbounded_channel();
        let (errors_tx, errors_rx) = unbounded_channel();

        Ok(Self {
            threads: options.general.threads,
            wordlist: options.general.wordlist.display().to_string(),
            progress: Arc::new(Progress::new(source.total_hint())),
            plugin,
            source,
            ctx: ProbeContext {
                client: Arc::new(client),
                cancel,
            },
            state: Arc::new(AtomicU8::new(EngineState::Created as u8)),
            senders: Mutex::new(Some(Senders {
                results: results_tx,
                errors: errors_tx,
            })),
            results: Mutex::new(Some(results_rx)),
            errors: Mutex::new(Some(errors_rx)),
        })
    }

    /// Takes the results receiver; `None` if it was already taken
    pub fn take_results(&self) -> Option<UnboundedReceiver<ProbeResult>> {
        take(&self.results)
    }

    /// Takes the errors receiver; `None` if it was already taken
    pub fn take_errors(&self) -> Option<UnboundedReceiver<ProbeError>> {
        take(&self.errors)
    }

    /// Shared handle on the progress counters
    pub fn progress_handle(&self) -> Arc<Progress> {
        self.progress.clone()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    /// Renders the run configuration for the startup banner
    pub fn config_string(&self) -> String {
        let mut out = String::new();
        config_line(&mut out, "Threads", self.threads);
        config_line(&mut out, "Wordlist", &self.wordlist);
        out.push_str(&self.plugin.config_string());
        out
    }

    fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Runs the engine to completion
    ///
    /// Blocks until the word source is exhausted and every in-flight probe
    /// finished, or until cancellation stopped the workers. Per-word failures
    /// go to the errors channel; only setup failures are returned here. The
    /// output channels are closed when this returns, whatever the outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The run finished or was cancelled
    /// * `Err(BusterError)` - The strategy's setup checks failed, or the
    ///   engine was already started
    pub async fn start(&self) -> Result<(), BusterError> {
        let senders = take(&self.senders).ok_or(BusterError::AlreadyStarted)?;
        self.set_state(EngineState::Running);

        tracing::info!(
            "Starting {} with {} workers over {} words",
            self.plugin.name(),
            self.threads,
            self.progress.snapshot().total
        );

        if let Err(e) = self.plugin.pre_run(&self.ctx).await {
            self.set_state(EngineState::Stopped);
            return Err(e);
        }

        let mut workers = Vec::with_capacity(self.threads);
        for id in 0..self.threads {
            let worker = Worker {
                id,
                plugin: self.plugin.clone(),
                source: self.source.clone(),
                ctx: self.ctx.clone(),
                progress: self.progress.clone(),
                state: self.state.clone(),
                results: senders.results.clone(),
                errors: senders.errors.clone(),
            };
            workers.push(tokio::spawn(worker.run()));
        }
        // workers now hold the only senders
        drop(senders);

        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        self.set_state(EngineState::Stopped);

        if self.ctx.cancel.is_cancelled() {
            tracing::info!("Run cancelled: {}", self.progress.snapshot());
        } else {
            tracing::info!("Run finished: {}", self.progress.snapshot());
        }

        Ok(())
    }
}

/// One member of the worker pool
struct Worker {
    id: usize,
    plugin: Arc<dyn Plugin>,
    source: Arc<dyn WordSource>,
    ctx: ProbeContext,
    progress: Arc<Progress>,
    state: Arc<AtomicU8>,
    results: UnboundedSender<ProbeResult>,
    errors: UnboundedSender<ProbeError>,
}

impl Worker {
    async fn run(self) {
        loop {
            let word = tokio::select! {
                biased;
                _ = self.ctx.cancel.cancelled() => break,
                word = self.source.next_word() => match word {
                    Some(word) => word,
                    None => {
                        let _ = self.state.compare_exchange(
                            EngineState::Running as u8,
                            EngineState::Draining as u8,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        );
                        break;
                    }
                },
            };

            // a send only fails once the consumer is gone, nothing left to do then
            match self.plugin.process(&self.ctx, &word).await {
                Ok(result) => {
                    tracing::trace!("Worker {}: {} -> {:?}", self.id, word, result.status);
                    let _ = self.results.send(result);
                }
                Err(error) => {
                    tracing::debug!("Worker {}: {}", self.id, error);
                    let _ = self.errors.send(error);
                }
            }

            self.progress.increment();
        }

        tracing::trace!("Worker {} stopped", self.id);
    }
}
