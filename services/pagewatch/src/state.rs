//! Monitor state owned by the polling loop

use std::time::Duration;

use crate::config::Config;
use crate::detector::{Classification, Fingerprint, KeywordSet};
use crate::extract::ElementSelector;
use crate::fetcher::Target;

/// Everything the loop remembers between cycles
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub target: Target,
    pub keywords: KeywordSet,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    pub last_fingerprint: Option<Fingerprint>,
    pub last_change_epoch_ms: Option<u64>,
    pub cycles: u64,
    pub consecutive_failures: u32,
    pub consecutive_missing: u32,
}

impl MonitorState {
    pub fn new(
        target: Target,
        keywords: KeywordSet,
        poll_interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            target,
            keywords,
            poll_interval,
            error_backoff,
            last_fingerprint: None,
            last_change_epoch_ms: None,
            cycles: 0,
            consecutive_failures: 0,
            consecutive_missing: 0,
        }
    }

    /// Build the initial state from a validated configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        config.validate()?;
        let target_config = &config.target;
        let selector = ElementSelector::new(&target_config.element_tag, &target_config.element_id)?;
        let target = Target {
            url: target_config.url.clone(),
            selector,
            request_timeout: Duration::from_secs(target_config.request_timeout_seconds),
        };

        Ok(Self::new(
            target,
            KeywordSet::new(&config.keywords),
            Duration::from_secs(target_config.polling_interval_seconds),
            Duration::from_secs(target_config.error_backoff_seconds),
        ))
    }

    /// Fold one cycle's classification into the state.
    ///
    /// The fingerprint only moves on successful reads; missing elements and failures keep it.
    pub fn record(&mut self, classification: &Classification, now_ms: u64) {
        self.cycles += 1;
        match classification {
            Classification::Baseline { fingerprint, .. } => {
                self.last_fingerprint = Some(fingerprint.clone());
                self.consecutive_failures = 0;
                self.consecutive_missing = 0;
            }
            Classification::Changed { fingerprint, .. } => {
                self.last_fingerprint = Some(fingerprint.clone());
                self.last_change_epoch_ms = Some(now_ms);
                self.consecutive_failures = 0;
                self.consecutive_missing = 0;
            }
            Classification::Unchanged => {
                self.consecutive_failures = 0;
                self.consecutive_missing = 0;
            }
            Classification::MissingElement => {
                self.consecutive_failures = 0;
                self.consecutive_missing += 1;
            }
            Classification::FetchFailed(_) => {
                self.consecutive_failures += 1;
            }
        }
    }
}
