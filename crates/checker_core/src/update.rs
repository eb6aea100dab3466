use crate::{Effect, FailedBatch, Msg, RunPhase, RunState};

/// Pure update function: applies a message to the run and returns the effects to execute.
///
/// Admission policy: `Start` fills every slot; each completion frees exactly one slot and
/// immediately admits the next queued batch, so no slot idles while batches remain.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match msg {
        Msg::Start => {
            if state.phase() != RunPhase::Idle {
                return (state, Vec::new());
            }
            state.begin();
            admit_next(&mut state)
        }
        Msg::BatchCompleted {
            batch_index,
            results,
            elapsed,
        } => {
            if !state.release(batch_index) {
                return (state, Vec::new());
            }
            state.results_mut().add(batch_index, results);
            state.progress_mut().record_completion(elapsed);
            admit_next(&mut state)
        }
        Msg::BatchFailed {
            batch_index,
            reason,
            elapsed,
        } => {
            if !state.release(batch_index) {
                return (state, Vec::new());
            }
            let urls = state
                .batch(batch_index)
                .map(|batch| batch.urls())
                .unwrap_or_default();
            state.results_mut().add_failed(FailedBatch {
                batch_index,
                urls,
                reason,
            });
            state.progress_mut().record_completion(elapsed);
            admit_next(&mut state)
        }
    };

    (state, effects)
}

fn admit_next(state: &mut RunState) -> Vec<Effect> {
    let mut effects: Vec<Effect> = state
        .fill_slots()
        .into_iter()
        .map(Effect::DispatchBatch)
        .collect();
    if state.finish_if_drained() {
        effects.push(Effect::RunFinished);
    }
    effects
}
