//! Operator-facing events emitted while auditing.
//!
//! The fetcher and the batch runner report through a [`FetchObserver`]
//! handed to them at construction, so nothing in the core touches global
//! logger state directly. [`LogObserver`] forwards to the `log` facade;
//! [`SilentObserver`] drops everything.

use crate::outcome::{CertificateOutcome, OutcomeStatus, DATE_FORMAT};

pub trait FetchObserver: Send + Sync {
    /// Called once per fetched domain, whatever the result.
    fn on_outcome(&self, outcome: &CertificateOutcome);

    /// Called once after a batch completes.
    fn on_batch_complete(&self, _outcomes: &[CertificateOutcome]) {}
}

/// Writes one line per domain through `log`: info on success, error on failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl LogObserver {
    /// Level and message of the line logged for `outcome`.
    pub fn event(outcome: &CertificateOutcome) -> (log::Level, String) {
        match outcome.status() {
            OutcomeStatus::Valid {
                issued_to,
                expires_on,
            } => (
                log::Level::Info,
                format!(
                    "[✔] {} - Issued to: {} - Expires: {}",
                    outcome.domain(),
                    issued_to.as_deref().unwrap_or("None"),
                    expires_on.format(DATE_FORMAT)
                ),
            ),
            OutcomeStatus::Failed(e) => (
                log::Level::Error,
                format!("[✖] {} - Error: {}", outcome.domain(), e),
            ),
        }
    }
}

impl FetchObserver for LogObserver {
    fn on_outcome(&self, outcome: &CertificateOutcome) {
        let (level, message) = Self::event(outcome);
        log::log!(level, "{}", message);
    }

    fn on_batch_complete(&self, outcomes: &[CertificateOutcome]) {
        let valid = outcomes.iter().filter(|o| o.is_valid()).count();
        log::info!(
            "Checked {} domains: {} valid, {} failed",
            outcomes.len(),
            valid,
            outcomes.len() - valid
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl FetchObserver for SilentObserver {
    fn on_outcome(&self, _outcome: &CertificateOutcome) {}
}
