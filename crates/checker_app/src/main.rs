mod config;
mod input;
mod logging;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use checker_engine::ensure_output_dir;
use checker_logging::{checker_info, checker_warn};
use clap::Parser;

use config::{AppConfig, CliOverrides};
use input::InputFormat;
use logging::LogDestination;

#[derive(Parser, Debug)]
#[command(author, version, about = "Check social media post URLs in bulk")]
struct Args {
    /// File with URLs, whitespace separated or a JSON request; stdin when omitted
    input: Option<PathBuf>,

    /// Parse the input as JSON (`{"urls": [...]}` or a bare array)
    #[arg(long, conflicts_with = "text")]
    json: bool,

    /// Parse the input as whitespace-separated text
    #[arg(long)]
    text: bool,

    /// RON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// URLs per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Batches checked at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-URL fetch timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Directory for results.csv and manifest.json
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip writing manifest.json
    #[arg(long, default_value_t = false)]
    no_manifest: bool,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    log: LogDestination,

    /// Log at debug level
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn input_format(&self) -> InputFormat {
        match (self.json, self.text) {
            (true, _) => InputFormat::Json,
            (_, true) => InputFormat::Text,
            _ => InputFormat::Detect,
        }
    }

    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            timeout_secs: self.timeout_secs,
            output_dir: self.output_dir.clone(),
            no_manifest: self.no_manifest,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::initialize(args.log, args.verbose);

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply(&args.overrides());
    let settings = config.check_settings()?;

    let raw = input::read_input(args.input.as_deref())?;
    let tasks = input::parse_tasks(&raw, args.input_format())?;
    if tasks.is_empty() {
        checker_warn!("no urls in input");
    }

    ensure_output_dir(&config.output_dir)
        .with_context(|| format!("unusable output directory {:?}", config.output_dir))?;

    let (report, summary) = run::run_check(
        &settings,
        config.extractor_rules(),
        tasks,
        &config.output_dir,
        &config.export_options(),
    )?;

    for line in run::summary_lines(&report) {
        println!("{line}");
    }
    println!("Results: {}", summary.csv_path.display());
    if let Some(manifest) = &summary.manifest_path {
        println!("Manifest: {}", manifest.display());
    }
    checker_info!(
        "exported {} rows to {:?}",
        summary.row_count,
        summary.csv_path
    );
    Ok(())
}
