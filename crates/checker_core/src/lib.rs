//! Checker core: pure run state machine, classification policy and result bookkeeping.
mod aggregate;
mod classify;
mod effect;
mod ingest;
mod msg;
mod progress;
mod state;
mod status;
mod task;
mod update;
mod view_model;

pub use aggregate::ResultAggregator;
pub use classify::{classify, classify_with, matching_rule, Rule, SignalSet, RULES};
pub use effect::Effect;
pub use ingest::{parse_check_request, parse_url_list, IngestError};
pub use msg::Msg;
pub use progress::{ProgressState, ProgressTracker};
pub use state::{RunPhase, RunState};
pub use status::{CheckResult, FailedBatch, RunReport, Status};
pub use task::{partition, tasks_from_urls, Batch, UrlTask};
pub use update::update;
pub use view_model::RunView;
