use crate::Batch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand this batch to a worker; it now occupies a concurrency slot.
    DispatchBatch(Batch),
    /// Every batch has been accounted for.
    RunFinished,
}
