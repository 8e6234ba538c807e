use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Step {step} is incomplete: expected {expected} worker reports, got {received}")]
    IncompleteStep {
        step: u64,
        expected: usize,
        received: usize,
    },

    #[error("Step {step} carries more than one report from worker {worker}")]
    DuplicateWorker { step: u64, worker: usize },

    #[error("Step {step} carries a report from unknown worker {worker} (collective size {size})")]
    UnknownWorker {
        step: u64,
        worker: usize,
        size: usize,
    },

    #[error(
        "Worker {worker} reported {received} sorbate populations at step {step}, expected {expected}"
    )]
    SpeciesMismatch {
        step: u64,
        worker: usize,
        expected: usize,
        received: usize,
    },

    #[error("Step {step} arrived after step {last}; steps must be folded in increasing order")]
    StepOutOfOrder { step: u64, last: u64 },

    #[error("Worker {worker} failed at step {step}: {reason}")]
    WorkerFailed {
        step: u64,
        worker: usize,
        reason: String,
    },

    #[error("Checkpoint does not match the running configuration: {0}")]
    CheckpointMismatch(String),
}
