//! Error types for certificate auditing.
//!
//! Two layers of errors exist. [`FetchError`] classifies why a single domain
//! could not be audited; it never escapes [`crate::CertificateFetcher::fetch`]
//! and ends up as the `error` field of an outcome. [`AuditError`] covers the
//! run as a whole: unreadable input, failed report writes, bad configuration.

use std::fmt;
use std::io;

use strum_macros::{AsRefStr, Display, EnumString};

use crate::config::ConfigError;

/// Category of a per-domain failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// DNS resolution, connection refusal or connect timeout
    Network,
    /// TLS protocol failure or certificate verification failure
    Handshake,
    /// Certificate data could not be normalized
    Parse,
}

/// Reason a single domain could not be audited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Name resolution or TCP connection failed
    Network {
        /// Target in `host:port` form
        address: String,
        /// What went wrong
        details: String,
    },

    /// TLS handshake failed, including certificate verification
    Handshake {
        /// What went wrong
        details: String,
    },

    /// The peer certificate could not be read or normalized
    Parse {
        /// What went wrong
        reason: String,
    },
}

impl FetchError {
    pub fn network(address: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Network {
            address: address.into(),
            details: details.into(),
        }
    }

    pub fn handshake(details: impl Into<String>) -> Self {
        Self::Handshake {
            details: details.into(),
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::Handshake { .. } => FailureKind::Handshake,
            Self::Parse { .. } => FailureKind::Parse,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { address, details } => {
                write!(f, "Network error connecting to {}: {}", address, details)
            }
            Self::Handshake { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::Parse { reason } => {
                write!(f, "Certificate parse error: {}", reason)
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Fatal error for a whole audit run.
#[derive(Debug)]
pub enum AuditError {
    /// The domain list could not be read
    DomainList {
        /// Path of the domain list
        path: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// A report artifact could not be written
    Output {
        /// Path of the artifact
        path: String,
        /// Description of the failure
        details: String,
    },

    /// Configuration could not be loaded or is invalid
    Config(ConfigError),

    /// The extra root certificate bundle could not be read or parsed
    CaFile {
        /// Path of the PEM bundle
        path: String,
        /// Description of the failure
        details: String,
    },

    /// The TLS client could not be set up
    Tls {
        /// The underlying OpenSSL error
        details: String,
    },

    /// Generic I/O error
    IoError {
        /// The underlying I/O error
        source: io::Error,
    },
}

impl AuditError {
    pub fn output(path: impl Into<String>, details: impl fmt::Display) -> Self {
        Self::Output {
            path: path.into(),
            details: details.to_string(),
        }
    }
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainList { path, source } => {
                write!(f, "Input file '{}' could not be read: {}", path, source)
            }
            Self::Output { path, details } => {
                write!(f, "Failed to write '{}': {}", path, details)
            }
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::CaFile { path, details } => {
                write!(f, "CA file '{}' could not be loaded: {}", path, details)
            }
            Self::Tls { details } => write!(f, "TLS setup error: {}", details),
            Self::IoError { source } => write!(f, "I/O error: {}", source),
        }
    }
}

impl std::error::Error for AuditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DomainList { source, .. } => Some(source),
            Self::Config(e) => Some(e),
            Self::IoError { source } => Some(source),
            Self::Output { .. } | Self::CaFile { .. } | Self::Tls { .. } => None,
        }
    }
}

impl From<io::Error> for AuditError {
    fn from(e: io::Error) -> Self {
        Self::IoError { source: e }
    }
}

impl From<ConfigError> for AuditError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<openssl::error::ErrorStack> for AuditError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::Tls {
            details: e.to_string(),
        }
    }
}
