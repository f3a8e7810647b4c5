//! The per-domain audit result.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::error::FetchError;

/// Date format used for `expires_on` in every report.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which branch an outcome took. Only one of them can exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Valid {
        issued_to: Option<String>,
        expires_on: NaiveDate,
    },
    Failed(FetchError),
}

/// Classified result of auditing one domain.
///
/// Built once by the fetcher and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateOutcome {
    domain: String,
    status: OutcomeStatus,
}

impl CertificateOutcome {
    pub fn valid(domain: impl Into<String>, issued_to: Option<String>, expires_on: NaiveDate) -> Self {
        CertificateOutcome {
            domain: domain.into(),
            status: OutcomeStatus::Valid {
                issued_to,
                expires_on,
            },
        }
    }

    pub fn failed(domain: impl Into<String>, error: FetchError) -> Self {
        CertificateOutcome {
            domain: domain.into(),
            status: OutcomeStatus::Failed(error),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn status(&self) -> &OutcomeStatus {
        &self.status
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.status, OutcomeStatus::Valid { .. })
    }

    pub fn issued_to(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Valid { issued_to, .. } => issued_to.as_deref(),
            OutcomeStatus::Failed(_) => None,
        }
    }

    pub fn expires_on(&self) -> Option<NaiveDate> {
        match &self.status {
            OutcomeStatus::Valid { expires_on, .. } => Some(*expires_on),
            OutcomeStatus::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.status {
            OutcomeStatus::Valid { .. } => None,
            OutcomeStatus::Failed(e) => Some(e),
        }
    }

    /// Flat view with the report field names, shared by the JSON and CSV writers.
    pub fn record(&self) -> OutcomeRecord<'_> {
        OutcomeRecord {
            domain: &self.domain,
            issued_to: self.issued_to(),
            expires_on: self
                .expires_on()
                .map(|d| d.format(DATE_FORMAT).to_string()),
            valid: self.is_valid(),
            error: self.error().map(|e| e.to_string()),
        }
    }
}

/// Serialized shape of an outcome: `domain, issued_to, expires_on, valid, error`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OutcomeRecord<'a> {
    pub domain: &'a str,
    pub issued_to: Option<&'a str>,
    pub expires_on: Option<String>,
    pub valid: bool,
    pub error: Option<String>,
}

impl Serialize for CertificateOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record().serialize(serializer)
    }
}
