use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use checker_core::{FailedBatch, RunReport, UrlTask};
use checker_logging::checker_error;

use crate::export::encode_payload;
use crate::scheduler::BatchScheduler;
use crate::settings::{CheckSettings, SettingsError};
use crate::sink::ChannelProgressSink;
use crate::EngineEvent;

/// What a polling client sees. `payload` is only set once `done` is true.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollStatus {
    pub percent: u8,
    pub eta: Option<Duration>,
    pub done: bool,
    pub payload: Option<String>,
    /// Batches that could not be processed, as they are reported.
    pub failed_batches: Vec<FailedBatch>,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),
    #[error("failed to spawn engine thread: {0}")]
    Thread(std::io::Error),
}

/// A run executing on its own thread and runtime, observed by polling.
pub struct EngineHandle {
    event_rx: mpsc::Receiver<EngineEvent>,
    status: PollStatus,
    report: Option<RunReport>,
}

impl EngineHandle {
    /// Start a run against the network with the default extractor.
    pub fn start(settings: &CheckSettings, tasks: Vec<UrlTask>) -> Result<Self, EngineError> {
        let scheduler = BatchScheduler::from_settings(settings)?;
        Self::spawn(scheduler, tasks)
    }

    pub fn spawn(scheduler: BatchScheduler, tasks: Vec<UrlTask>) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new().map_err(EngineError::Runtime)?;
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("checker-engine".to_string())
            .spawn(move || {
                let sink = ChannelProgressSink::new(event_tx);
                runtime.block_on(scheduler.run(tasks, &sink));
            })
            .map_err(EngineError::Thread)?;

        Ok(Self {
            event_rx,
            status: PollStatus::default(),
            report: None,
        })
    }

    /// Drain pending events and return the current status.
    pub fn poll(&mut self) -> PollStatus {
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply(event);
        }
        self.status.clone()
    }

    /// Block until the run finishes. `None` if the engine thread died before reporting.
    pub fn wait(mut self) -> Option<RunReport> {
        while self.report.is_none() {
            match self.event_rx.recv() {
                Ok(event) => self.apply(event),
                Err(_) => break,
            }
        }
        self.report
    }

    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Progress(progress) => {
                self.status.percent = progress.percent;
                self.status.eta = progress.eta;
            }
            EngineEvent::RunFinished(report) => {
                self.status.percent = 100;
                self.status.eta = Some(Duration::ZERO);
                self.status.failed_batches = report.failed_batches.clone();
                self.status.payload = match encode_payload(&report) {
                    Ok(payload) => Some(payload),
                    Err(err) => {
                        checker_error!("failed to encode result payload: {}", err);
                        None
                    }
                };
                self.status.done = true;
                self.report = Some(report);
            }
            EngineEvent::BatchFailed(failed) => self.status.failed_batches.push(failed),
            EngineEvent::BatchDispatched { .. } | EngineEvent::BatchCompleted { .. } => {}
        }
    }
}
