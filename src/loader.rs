//! Reads the list of domains to audit.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::AuditError;

/// Loads one domain per line from `path`, trimming whitespace and dropping
/// blank lines. Order is kept.
pub fn load_domains<P: AsRef<Path>>(path: P) -> Result<Vec<String>, AuditError> {
    let path = path.as_ref();
    let to_error = |source| AuditError::DomainList {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(to_error)?;
    let domains = parse_domains(BufReader::new(file)).map_err(to_error)?;
    log::info!("Loaded {} domains from {}", domains.len(), path.display());
    Ok(domains)
}

pub fn parse_domains<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut domains = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let domain = line.trim();
        if !domain.is_empty() {
            domains.push(domain.to_string());
        }
    }
    Ok(domains)
}
