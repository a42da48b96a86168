use common::SagaId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("saga {0} is already registered")]
    AlreadyRegistered(SagaId),

    #[error("saga {0} not found")]
    NotFound(SagaId),
}
