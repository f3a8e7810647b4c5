//! Batch TLS certificate auditing.
//!
//! For every domain in a list, certaudit performs one TLS handshake, reads the
//! leaf certificate's common name and expiry date, and classifies the result
//! as valid or failed with a reason. Results keep the input order and are
//! written as a JSON array and a CSV table.
//!
//! ```no_run
//! use certaudit::{BatchRunner, CertificateFetcher};
//!
//! let fetcher = CertificateFetcher::new()?;
//! let outcomes = BatchRunner::new(fetcher).run(&["example.com", "rust-lang.org"]);
//! for outcome in &outcomes {
//!     println!("{} valid={}", outcome.domain(), outcome.is_valid());
//! }
//! # Ok::<(), openssl::error::ErrorStack>(())
//! ```

pub mod audit;
pub mod batch;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod loader;
pub mod logging;
pub mod observer;
pub mod outcome;
pub mod output;

pub use audit::{fetcher_from_config, run_audit};
pub use batch::BatchRunner;
pub use config::{Config, ConfigError};
pub use error::{AuditError, FailureKind, FetchError};
pub use fetcher::{CertificateFetcher, Fetch, FetcherBuilder, LeafCertificate};
pub use observer::{FetchObserver, LogObserver, SilentObserver};
pub use outcome::{CertificateOutcome, OutcomeRecord, OutcomeStatus};
