//! Report writers: JSON array, CSV table and a terminal summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use crate::error::AuditError;
use crate::outcome::CertificateOutcome;

/// Column order shared by the JSON objects and the CSV header.
pub const FIELDS: [&str; 5] = ["domain", "issued_to", "expires_on", "valid", "error"];

/// Writes `outcomes` as a JSON array indented by four spaces.
pub fn write_json<W: Write>(writer: W, outcomes: &[CertificateOutcome]) -> serde_json::Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    outcomes.serialize(&mut serializer)
}

/// Writes a header row followed by one row per outcome. Null fields become
/// empty cells.
pub fn write_csv<W: Write>(writer: W, outcomes: &[CertificateOutcome]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(FIELDS)?;
    for outcome in outcomes {
        writer.serialize(outcome.record())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_json<P: AsRef<Path>>(path: P, outcomes: &[CertificateOutcome]) -> Result<(), AuditError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| AuditError::output(path.display().to_string(), e))?;
    let mut writer = BufWriter::new(file);
    write_json(&mut writer, outcomes)
        .map_err(|e| AuditError::output(path.display().to_string(), e))?;
    writer
        .flush()
        .map_err(|e| AuditError::output(path.display().to_string(), e))?;
    log::info!("Saved JSON output to {}", path.display());
    Ok(())
}

pub fn save_csv<P: AsRef<Path>>(path: P, outcomes: &[CertificateOutcome]) -> Result<(), AuditError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| AuditError::output(path.display().to_string(), e))?;
    write_csv(BufWriter::new(file), outcomes)
        .map_err(|e| AuditError::output(path.display().to_string(), e))?;
    log::info!("Saved CSV output to {}", path.display());
    Ok(())
}

/// Renders a human readable table of the run for stdout.
pub fn summary_table(outcomes: &[CertificateOutcome]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Domain", "Status", "Issued To", "Expires On", "Error"]);

    for outcome in outcomes {
        let record = outcome.record();
        let status = match outcome.error() {
            None => "valid".to_string(),
            Some(e) => e.kind().to_string(),
        };
        table.add_row(vec![
            record.domain.to_string(),
            status,
            record.issued_to.unwrap_or_default().to_string(),
            record.expires_on.unwrap_or_default(),
            record.error.unwrap_or_default(),
        ]);
    }
    table
}
