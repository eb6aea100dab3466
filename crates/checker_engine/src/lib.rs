//! Checker engine: fetching, signal extraction, batch execution and export.
mod decode;
mod engine;
mod export;
mod extract;
mod fetch;
mod persist;
mod scheduler;
mod settings;
mod sink;
mod types;
mod worker;

pub use decode::{decode_html, DecodedHtml};
pub use engine::{EngineError, EngineHandle, PollStatus};
pub use export::{
    build_manifest, encode_payload, export_report, report_to_csv, write_csv, ExportError,
    ExportOptions, ExportSummary, BATCH_FAILED_LABEL, CSV_HEADER,
};
pub use extract::{ExtractorRules, PhraseSignalExtractor, SignalExtractor};
pub use fetch::{FetchBackend, PageFetcher, ReqwestBackend, ReqwestFetcher};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use scheduler::BatchScheduler;
pub use settings::{CheckSettings, FetchSettings, SettingsError, DEFAULT_USER_AGENT};
pub use sink::{ChannelProgressSink, NullSink, ProgressSink};
pub use types::{
    BackendError, BatchError, EngineEvent, FailureKind, FetchError, FetchOutcome, FetchedPage,
};
pub use worker::{status_for_outcome, system_clock, BatchWorker, Clock};
