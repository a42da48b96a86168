use common::SagaId;
use thiserror::Error;

/// Errors surfaced by [`crate::coordinator::OrderSagaCoordinator`] itself,
/// as opposed to a saga's own terminal `Failed` status (which is not an
/// error — it is a normal, successfully-returned outcome).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("saga {0} not found or already finished")]
    NotRunning(SagaId),

    #[error(transparent)]
    Registry(#[from] registry::RegistryError),
}
