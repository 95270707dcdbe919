//! Pagewatch - web page change monitoring and email notification
//!
//! Polls one page, fingerprints a single element, and sends email when the element
//! changes, disappears, mentions a keyword, or cannot be fetched.

pub mod config;
pub mod detector;
pub mod email;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod interval;
pub mod io;
pub mod notifier;
pub mod state;

pub use config::{load_config, Config};
pub use error::{PageWatchError, Result};

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::email::SmtpNotifier;
use crate::engine::Engine;
use crate::fetcher::{ContentFetcher, PageFetcher};
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::Notifier;
use crate::state::MonitorState;

/// Assembles a monitor from configuration, with optional injected collaborators
pub struct PageWatchBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    fetcher: Option<Arc<dyn ContentFetcher>>,
    notifier: Option<Arc<dyn Notifier>>,
    cancel: Option<CancellationToken>,
}

impl PageWatchBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            fetcher: None,
            notifier: None,
            cancel: None,
        }
    }

    /// Use this HTTP client for the default page fetcher
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Replace the page fetcher entirely
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the SMTP notifier. Email settings are then not required.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validate configuration and wire up the engine. Nothing is fetched yet.
    pub fn build(self) -> Result<PageWatch> {
        let state = MonitorState::from_config(&self.config)?;

        let fetcher: Arc<dyn ContentFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => {
                let http: Arc<dyn HttpClient> = match self.http {
                    Some(http) => http,
                    None => Arc::new(ReqwestHttpClient::new()?),
                };
                Arc::new(PageFetcher::new(http))
            }
        };

        let notifier: Arc<dyn Notifier> = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(SmtpNotifier::from_config(&self.config.email)?),
        };

        let cancel = self.cancel.unwrap_or_default();

        tracing::debug!(
            "Built monitor for {} (element '{}', every {:?}, keywords {:?}, notifier '{}')",
            state.target.url,
            state.target.element_id(),
            state.poll_interval,
            state.keywords.terms(),
            notifier.type_name()
        );

        Ok(PageWatch {
            engine: Engine::new(fetcher, notifier, state, cancel.clone()),
            cancel,
        })
    }
}

/// A built monitor, ready to run
#[derive(Debug)]
pub struct PageWatch {
    engine: Engine,
    cancel: CancellationToken,
}

impl PageWatch {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &MonitorState {
        self.engine.state()
    }

    /// Run the loop on the current task until cancelled
    pub async fn run(self) -> MonitorState {
        self.engine.run().await
    }

    /// Spawn the loop onto the tokio runtime
    pub fn start(self) -> MonitorHandle {
        tracing::info!("Starting monitor for {}", self.engine.state().target.url);
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.engine.run());
        MonitorHandle { cancel, task }
    }

    /// Start the loop and wait until it is cancelled or ends on its own.
    ///
    /// A loop that ends without being cancelled is an error.
    pub async fn supervise(self) -> Result<MonitorState> {
        let url = self.engine.state().target.url.clone();
        supervise(url, self.start()).await
    }
}

async fn supervise(url: String, mut handle: MonitorHandle) -> Result<MonitorState> {
    let cancel = handle.cancel.clone();
    let ended_early = tokio::select! {
        _ = cancel.cancelled() => None,
        joined = &mut handle.task => Some(joined),
    };

    let Some(joined) = ended_early else {
        return handle.stop().await;
    };
    let detail = match joined {
        Ok(state) => format!(
            "monitor for {} stopped unexpectedly after {} cycle(s)",
            url, state.cycles
        ),
        Err(e) => format!("monitor task for {} failed: {}", url, e),
    };
    tracing::error!("{}", detail);
    Err(PageWatchError::Monitor(detail))
}

/// Handle to a running monitor
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<MonitorState>,
}

impl MonitorHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request cancellation and wait for the loop to finish its current cycle
    pub async fn stop(self) -> Result<MonitorState> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| PageWatchError::Monitor(format!("monitor task failed: {}", e)))
    }
}

/// Run the pagewatch service with the given configuration until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let watch = PageWatchBuilder::new(config).build()?;
    let cancel = watch.cancellation_token();

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                cancel_for_signal.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
    });

    let state = watch.supervise().await?;
    tracing::info!(
        "Pagewatch stopped after {} cycle(s) on {}",
        state.cycles,
        state.target.url
    );
    Ok(())
}
