//! One complete audit run: load, fetch, write.

use std::fs;
use std::sync::Arc;

use openssl::x509::X509;

use crate::batch::BatchRunner;
use crate::config::Config;
use crate::error::AuditError;
use crate::fetcher::{CertificateFetcher, DEFAULT_PORT};
use crate::loader::load_domains;
use crate::observer::FetchObserver;
use crate::outcome::CertificateOutcome;
use crate::output::{save_csv, save_json};

/// Builds the fetcher described by `config`, reporting to `observer`.
pub fn fetcher_from_config(
    config: &Config,
    observer: Arc<dyn FetchObserver>,
) -> Result<CertificateFetcher, AuditError> {
    let mut builder = CertificateFetcher::builder()
        .port(config.port.unwrap_or(DEFAULT_PORT))
        .timeout(config.timeout())
        .observer(observer);

    if let Some(ca_file) = &config.ca_file {
        let to_error = |details: String| AuditError::CaFile {
            path: ca_file.clone(),
            details,
        };
        let pem = fs::read(ca_file).map_err(|e| to_error(e.to_string()))?;
        let roots = X509::stack_from_pem(&pem).map_err(|e| to_error(e.to_string()))?;
        if roots.is_empty() {
            return Err(to_error("no PEM certificates found".to_string()));
        }
        for root in roots {
            builder = builder.root_certificate(root);
        }
    }

    Ok(builder.build()?)
}

/// Audits every domain listed in `config.input` and writes both reports.
///
/// Returns `Ok(None)` without touching the output paths when the list is
/// empty. A missing or unreadable list is fatal and nothing is written.
pub fn run_audit(
    config: &Config,
    observer: Arc<dyn FetchObserver>,
) -> Result<Option<Vec<CertificateOutcome>>, AuditError> {
    config.validate()?;

    let input = config.input.as_deref().unwrap_or("domains.txt");
    let domains = load_domains(input)?;
    if domains.is_empty() {
        log::warn!("No domains found in {}, nothing to do", input);
        return Ok(None);
    }

    let fetcher = fetcher_from_config(config, observer.clone())?;
    let runner = BatchRunner::new(fetcher)
        .with_concurrency(config.concurrency.unwrap_or(1))
        .with_observer(observer);
    let outcomes = runner.run(&domains);

    save_json(
        config.json_output.as_deref().unwrap_or("ssl_results.json"),
        &outcomes,
    )?;
    save_csv(
        config.csv_output.as_deref().unwrap_or("ssl_results.csv"),
        &outcomes,
    )?;

    Ok(Some(outcomes))
}
