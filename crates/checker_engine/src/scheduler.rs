use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use checker_core::{update, Batch, Effect, FailedBatch, Msg, RunReport, RunState, UrlTask};
use checker_logging::{checker_error, checker_info, checker_warn, RUN_TARGET};
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::task::{Id, JoinSet};

use crate::extract::{PhraseSignalExtractor, SignalExtractor};
use crate::fetch::{FetchBackend, ReqwestBackend};
use crate::settings::{CheckSettings, SettingsError};
use crate::worker::BatchWorker;
use crate::{BatchError, EngineEvent, ProgressSink};

type BatchOutput = (usize, Result<Vec<checker_core::CheckResult>, BatchError>);

/// Runs batches through a bounded pool of workers.
///
/// Admission (which batch runs when) is decided by the `checker_core` run state machine;
/// this type only executes its effects and feeds completions back, one at a time, from a
/// single loop.
#[derive(Clone)]
pub struct BatchScheduler {
    worker: Arc<BatchWorker>,
    batch_size: usize,
    concurrency: usize,
}

impl BatchScheduler {
    pub fn new(worker: BatchWorker, batch_size: usize, concurrency: usize) -> Self {
        Self {
            worker: Arc::new(worker),
            batch_size,
            concurrency,
        }
    }

    /// Scheduler over the reqwest backend and the default phrase extractor.
    pub fn from_settings(settings: &CheckSettings) -> Result<Self, SettingsError> {
        let backend: Arc<dyn FetchBackend> = Arc::new(ReqwestBackend::new(settings.fetch.clone()));
        let extractor: Arc<dyn SignalExtractor> = Arc::new(PhraseSignalExtractor::default());
        Self::with_backend(settings, backend, extractor)
    }

    pub fn with_backend(
        settings: &CheckSettings,
        backend: Arc<dyn FetchBackend>,
        extractor: Arc<dyn SignalExtractor>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let worker = BatchWorker::new(
            backend,
            extractor,
            settings.fetch_timeout,
            settings.max_pages_per_batch,
        );
        Ok(Self::new(worker, settings.batch_size, settings.concurrency))
    }

    pub async fn run(&self, tasks: Vec<UrlTask>, sink: &dyn ProgressSink) -> RunReport {
        let started = Instant::now();
        let url_count = tasks.len();
        let state = RunState::new(tasks, self.batch_size, self.concurrency);
        checker_info!(
            target: RUN_TARGET,
            "checking {} urls in {} batches (batch size {}, concurrency {})",
            url_count,
            state.total_batches(),
            self.batch_size,
            self.concurrency
        );

        let mut running: JoinSet<BatchOutput> = JoinSet::new();
        let mut task_batches: HashMap<Id, usize> = HashMap::new();

        let (mut state, effects) = update(state, Msg::Start);
        let mut finished = self.apply(effects, &mut running, &mut task_batches, sink);

        while !finished {
            let Some(joined) = running.join_next_with_id().await else {
                break;
            };
            let elapsed = started.elapsed();
            let msg = match joined {
                Ok((id, (batch_index, Ok(results)))) => {
                    task_batches.remove(&id);
                    checker_info!(
                        target: RUN_TARGET,
                        "batch {} done: {} results",
                        batch_index,
                        results.len()
                    );
                    sink.emit(EngineEvent::BatchCompleted {
                        batch_index,
                        results: results.clone(),
                    });
                    Msg::BatchCompleted {
                        batch_index,
                        results,
                        elapsed,
                    }
                }
                Ok((id, (batch_index, Err(err)))) => {
                    task_batches.remove(&id);
                    checker_warn!(target: RUN_TARGET, "batch {} failed: {}", batch_index, err);
                    self.failed_msg(&state, batch_index, err, elapsed, sink)
                }
                Err(join_err) => {
                    let Some(batch_index) = task_batches.remove(&join_err.id()) else {
                        checker_error!("untracked batch task ended: {}", join_err);
                        continue;
                    };
                    checker_error!(
                        target: RUN_TARGET,
                        "batch {} worker aborted: {}",
                        batch_index,
                        join_err
                    );
                    self.failed_msg(
                        &state,
                        batch_index,
                        BatchError::WorkerPanicked,
                        elapsed,
                        sink,
                    )
                }
            };

            let (next, effects) = update(state, msg);
            state = next;
            sink.emit(EngineEvent::Progress(state.view().progress));
            finished = self.apply(effects, &mut running, &mut task_batches, sink);
        }

        let report = state.into_report();
        checker_info!(
            target: RUN_TARGET,
            "run finished in {:?}: {} results, {} failed batches",
            started.elapsed(),
            report.results.len(),
            report.failed_batches.len()
        );
        sink.emit(EngineEvent::RunFinished(report.clone()));
        report
    }

    /// The same run, observed as a stream of events ending with `RunFinished`.
    ///
    /// Must be called within a tokio runtime. Dropping the stream stops observation only;
    /// batches already running finish through their own fetch timeouts.
    pub fn stream(&self, tasks: Vec<UrlTask>) -> impl Stream<Item = EngineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = self.clone();
        tokio::spawn(async move {
            let sink = UnboundedSink { tx };
            scheduler.run(tasks, &sink).await;
        });
        futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
    }

    fn failed_msg(
        &self,
        state: &RunState,
        batch_index: usize,
        err: BatchError,
        elapsed: std::time::Duration,
        sink: &dyn ProgressSink,
    ) -> Msg {
        let urls = state
            .batch(batch_index)
            .map(Batch::urls)
            .unwrap_or_default();
        let reason = err.to_string();
        sink.emit(EngineEvent::BatchFailed(FailedBatch {
            batch_index,
            urls,
            reason: reason.clone(),
        }));
        Msg::BatchFailed {
            batch_index,
            reason,
            elapsed,
        }
    }

    /// Execute effects; returns true once the run is finished.
    fn apply(
        &self,
        effects: Vec<Effect>,
        running: &mut JoinSet<BatchOutput>,
        task_batches: &mut HashMap<Id, usize>,
        sink: &dyn ProgressSink,
    ) -> bool {
        let mut finished = false;
        for effect in effects {
            match effect {
                Effect::DispatchBatch(batch) => {
                    sink.emit(EngineEvent::BatchDispatched {
                        batch_index: batch.index,
                        size: batch.len(),
                    });
                    let worker = self.worker.clone();
                    let batch_index = batch.index;
                    let handle = running.spawn(async move {
                        let outcome = worker.run(&batch).await;
                        (batch.index, outcome)
                    });
                    task_batches.insert(handle.id(), batch_index);
                }
                Effect::RunFinished => finished = true,
            }
        }
        finished
    }
}

struct UnboundedSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ProgressSink for UnboundedSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
