use common::SagaId;
use thiserror::Error;

/// Programming-bug / precondition-violation errors from the engine itself.
///
/// Business failures of individual steps are never represented here — they
/// show up as a saga's terminal `Failed` status and its execution log, not
/// as a `Result::Err`.
#[derive(Debug, Error)]
pub enum SagaError {
    #[error("saga {0} is not in the started state")]
    NotStarted(SagaId),

    #[error("compensation requested from out-of-range step index {index} (saga has {step_count} steps)")]
    CompensationIndexOutOfRange { index: usize, step_count: usize },
}
