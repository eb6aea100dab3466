use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use checker_core::{RunReport, UrlTask};
use checker_engine::{
    export_report, BatchScheduler, CheckSettings, EngineHandle, ExportOptions, ExportSummary,
    ExtractorRules, PhraseSignalExtractor, PollStatus, ReqwestBackend,
};
use checker_logging::{checker_info, checker_warn};
use chrono::Utc;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Check every task against the network, showing progress on stderr, then export.
pub fn run_check(
    settings: &CheckSettings,
    rules: ExtractorRules,
    tasks: Vec<UrlTask>,
    output_dir: &Path,
    options: &ExportOptions,
) -> Result<(RunReport, ExportSummary)> {
    let scheduler = BatchScheduler::with_backend(
        settings,
        Arc::new(ReqwestBackend::new(settings.fetch.clone())),
        Arc::new(PhraseSignalExtractor::new(rules)),
    )
    .context("invalid check settings")?;

    checker_info!(
        "run started at {} with {} urls",
        Utc::now().to_rfc3339(),
        tasks.len()
    );
    let mut handle = EngineHandle::spawn(scheduler, tasks).context("failed to start engine")?;

    let mut shown = None;
    loop {
        let status = handle.poll();
        if shown != Some((status.percent, status.done)) {
            show_progress(&status);
            shown = Some((status.percent, status.done));
        }
        if status.done {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }
    eprintln!();

    let report = handle
        .wait()
        .ok_or_else(|| anyhow!("engine stopped without a report"))?;
    for failed in &report.failed_batches {
        checker_warn!(
            "batch {} failed ({} urls): {}",
            failed.batch_index,
            failed.urls.len(),
            failed.reason
        );
    }

    let summary = export_report(output_dir, &report, options)
        .with_context(|| format!("failed to export results to {}", output_dir.display()))?;
    Ok((report, summary))
}

fn show_progress(status: &PollStatus) {
    let eta = match status.eta {
        Some(eta) if !status.done => format!(", about {}s left", eta.as_secs()),
        _ => String::new(),
    };
    let mut stderr = io::stderr();
    let _ = write!(stderr, "\rchecked {:>3}%{:<24}", status.percent, eta);
    let _ = stderr.flush();
}

/// One line per status label, e.g. `Active: 3`.
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .status_counts()
        .into_iter()
        .map(|(label, count)| format!("{label}: {count}"))
        .collect();
    if !report.failed_batches.is_empty() {
        let urls: usize = report.failed_batches.iter().map(|b| b.urls.len()).sum();
        lines.push(format!(
            "Failed batches: {} ({} urls not checked)",
            report.failed_batches.len(),
            urls
        ));
    }
    lines
}
