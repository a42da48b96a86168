//! Shared identifiers and value types used across the saga orchestration core.

pub mod ids;
pub mod money;
pub mod participant;

pub use ids::SagaId;
pub use money::Money;
pub use participant::{Participant, ParticipantParseError};
