//! Engine: the fetch, classify, notify, sleep loop

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::detector::{classify, Classification};
use crate::fetcher::{ContentFetcher, Target};
use crate::notifier::{Notification, Notifier};
use crate::state::MonitorState;

const FAILURE_WARN_THRESHOLD: u32 = 5;

/// Outcome of sending a cycle's notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// What happened in one cycle, and how long the loop will sleep afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub classification: Classification,
    pub dispatch: DispatchOutcome,
    pub next_sleep: Duration,
}

/// The engine owns the monitor state and drives one cycle at a time
#[derive(Debug)]
pub struct Engine {
    fetcher: Arc<dyn ContentFetcher>,
    notifier: Arc<dyn Notifier>,
    state: MonitorState,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn Notifier>,
        state: MonitorState,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            state,
            cancel,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Run a single fetch, classify, notify step. Never fails; the report says what to do next.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let url = self.state.target.url.clone();
        tracing::info!("Checking {} for updates", url);

        let fetched = self.fetcher.fetch(&self.state.target).await;
        let classification = classify(
            self.state.last_fingerprint.as_ref(),
            fetched,
            &self.state.keywords,
        );
        self.state.record(&classification, current_epoch_ms());

        match &classification {
            Classification::Baseline {
                fingerprint,
                keyword_hit,
            } => tracing::info!(
                "Monitoring initialized for {} (fingerprint {}, keyword match: {})",
                url,
                fingerprint,
                keyword_hit
            ),
            Classification::Unchanged => tracing::info!("No updates detected on {}", url),
            Classification::Changed {
                fingerprint,
                keyword_hit,
                ..
            } => tracing::info!(
                "Content update detected on {} (fingerprint {}, keyword match: {})",
                url,
                fingerprint,
                keyword_hit
            ),
            Classification::MissingElement => tracing::warn!(
                "Element '{}' missing on {} ({} cycle(s) in a row)",
                self.state.target.element_id(),
                url,
                self.state.consecutive_missing
            ),
            Classification::FetchFailed(detail) => {
                tracing::error!("Error while monitoring {}: {}", url, detail);
                if self.state.consecutive_failures == FAILURE_WARN_THRESHOLD {
                    tracing::warn!(
                        "{} has failed {} cycles in a row",
                        url,
                        self.state.consecutive_failures
                    );
                }
            }
        }

        let notifications = notifications_for(&classification, &self.state);
        let dispatch = dispatch_notifications(self.notifier.as_ref(), &notifications).await;

        let failed_cycle =
            matches!(classification, Classification::FetchFailed(_)) || dispatch.failed > 0;
        let next_sleep = if failed_cycle {
            self.state.error_backoff
        } else {
            self.state.poll_interval
        };

        tracing::debug!(
            "Cycle {} for {}: {} (sent={}, failed={}), next check in {:?}",
            self.state.cycles,
            url,
            classification.label(),
            dispatch.sent,
            dispatch.failed,
            next_sleep
        );

        CycleReport {
            classification,
            dispatch,
            next_sleep,
        }
    }

    /// Poll until the cancellation token fires, then hand back the final state.
    ///
    /// Cancellation is observed before each cycle and during the sleep, so a cycle
    /// that has started always finishes its dispatch. A cycle that panics is
    /// reported as a failure and the loop carries on after the error backoff.
    pub async fn run(mut self) -> MonitorState {
        loop {
            if self.cancel.is_cancelled() {
                tracing::debug!("Polling loop for {} cancelled", self.state.target.url);
                break;
            }

            let cycles_before = self.state.cycles;
            let next_sleep = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                Ok(report) => report.next_sleep,
                Err(panic) => {
                    self.recover_from_panic(cycles_before, panic_message(panic.as_ref()))
                        .await
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(next_sleep) => {}
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Polling loop for {} cancelled", self.state.target.url);
                    break;
                }
            }
        }
        self.state
    }

    /// Treat a panicked cycle as a failed one: count it, report it if possible, back off.
    async fn recover_from_panic(&mut self, cycles_before: u64, detail: String) -> Duration {
        let url = self.state.target.url.clone();
        tracing::error!("Cycle for {} panicked: {}", url, detail);

        let detail = format!("unexpected failure: {}", detail);
        if self.state.cycles == cycles_before {
            let failed = Classification::FetchFailed(detail.clone());
            self.state.record(&failed, current_epoch_ms());
        }

        let notification = Notification::error(&url, &detail);
        let send = dispatch_notifications(
            self.notifier.as_ref(),
            std::slice::from_ref(&notification),
        );
        if AssertUnwindSafe(send).catch_unwind().await.is_err() {
            tracing::error!("Error notification for {} panicked as well", url);
        }

        self.state.error_backoff
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// Notifications a classification calls for, in sending order
pub fn notifications_for(
    classification: &Classification,
    state: &MonitorState,
) -> Vec<Notification> {
    let target: &Target = &state.target;
    match classification {
        Classification::Baseline { .. } | Classification::Unchanged => Vec::new(),
        Classification::Changed {
            content,
            keyword_hit,
            ..
        } => {
            let mut notifications = vec![Notification::content_updated(&target.url, content)];
            if *keyword_hit {
                let hits = state.keywords.matches_in(content);
                notifications.push(Notification::keyword_detected(&target.url, &hits));
            }
            notifications
        }
        Classification::MissingElement => vec![Notification::content_missing(
            &target.url,
            target.element_id(),
        )],
        Classification::FetchFailed(detail) => vec![Notification::error(&target.url, detail)],
    }
}

/// Send notifications one after another. A failed send is logged and does not stop the rest.
pub async fn dispatch_notifications(
    notifier: &dyn Notifier,
    notifications: &[Notification],
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for notification in notifications {
        tracing::debug!(
            "Dispatching '{}' via '{}'",
            notification.subject,
            notifier.type_name()
        );
        match notifier.notify(notification).await {
            Ok(()) => {
                tracing::info!("{} notification sent", notification.kind);
                outcome.sent += 1;
            }
            Err(e) => {
                tracing::warn!(
                    "Notification '{}' via '{}' failed: {}",
                    notification.subject,
                    notifier.type_name(),
                    e
                );
                outcome.failed += 1;
            }
        }
    }
    outcome
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
