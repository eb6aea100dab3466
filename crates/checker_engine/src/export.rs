use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use checker_core::RunReport;
use chrono::SecondsFormat;
use serde_json::json;

use crate::persist::{AtomicFileWriter, PersistError};

pub const CSV_HEADER: [&str; 4] = ["url", "status", "reason", "checked_at"];

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub csv_filename: String,
    pub manifest_filename: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            csv_filename: "results.csv".to_string(),
            manifest_filename: Some("manifest.json".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// CSV data rows, failed-batch URLs included.
    pub row_count: usize,
    pub failed_batch_count: usize,
    pub csv_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Status column for URLs of a batch that could not be processed at all.
pub const BATCH_FAILED_LABEL: &str = "BatchFailed";

/// One row per result in input order (`url,status,reason,checked_at`, RFC 3339 UTC),
/// then one `BatchFailed` row per URL of each failed batch, with the batch reason
/// and an empty `checked_at`.
pub fn write_csv<W: Write>(report: &RunReport, writer: W) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(CSV_HEADER)?;
    for result in &report.results {
        let checked_at = result.checked_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        out.write_record([
            result.url.as_str(),
            result.status.label(),
            result.status.reason().unwrap_or(""),
            checked_at.as_str(),
        ])?;
    }
    for failed in &report.failed_batches {
        let reason = failed.reason.as_str();
        for url in &failed.urls {
            out.write_record([url.as_str(), BATCH_FAILED_LABEL, reason, ""])?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn report_to_csv(report: &RunReport) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    write_csv(report, &mut buffer)?;
    Ok(buffer)
}

/// Base64 CSV blob handed to polling clients once a run is done.
pub fn encode_payload(report: &RunReport) -> Result<String, ExportError> {
    let csv = report_to_csv(report)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(csv))
}

pub fn build_manifest(report: &RunReport) -> serde_json::Value {
    let counts: serde_json::Map<String, serde_json::Value> = report
        .status_counts()
        .into_iter()
        .map(|(label, count)| (label.to_string(), json!(count)))
        .collect();
    json!({
        "result_count": report.results.len(),
        "accounted_urls": report.accounted_urls(),
        "status_counts": counts,
        "failed_batches": report.failed_batches,
    })
}

/// Write the CSV (and optionally the JSON manifest) into `output_dir`.
pub fn export_report(
    output_dir: &Path,
    report: &RunReport,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let csv = report_to_csv(report)?;
    let manifest = build_manifest(report).to_string();

    let mut files: Vec<(&str, &[u8])> = vec![(options.csv_filename.as_str(), csv.as_slice())];
    if let Some(name) = &options.manifest_filename {
        files.push((name.as_str(), manifest.as_bytes()));
    }

    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let mut written = writer.write_all(&files)?.into_iter();
    let csv_path = written
        .next()
        .ok_or_else(|| PersistError::InvalidName(options.csv_filename.clone()))?;
    let manifest_path = written.next();

    Ok(ExportSummary {
        row_count: report.accounted_urls(),
        failed_batch_count: report.failed_batches.len(),
        csv_path,
        manifest_path,
    })
}
