//! Concurrent, in-memory home for every saga the process knows about.
//!
//! [`SagaRegistry`] is the one shared mutable structure in the core (§5):
//! many saga tasks insert and update their own entry while the HTTP API
//! reads across all of them concurrently. Backed by [`dashmap::DashMap`]
//! rather than a single `Mutex<HashMap<_>>` so reads never block on an
//! unrelated saga's write.

mod error;
mod statistics;

pub use error::RegistryError;
pub use statistics::SagaStatistics;

use std::collections::HashMap;

use common::SagaId;
use dashmap::DashMap;
use saga_engine::{SagaSnapshot, SagaStatus};

#[derive(Default)]
pub struct SagaRegistry {
    sagas: DashMap<SagaId, SagaSnapshot>,
}

impl SagaRegistry {
    pub fn new() -> Self {
        Self { sagas: DashMap::new() }
    }

    /// Inserts a saga's snapshot at creation time. Calling this twice for
    /// the same ID is a programming error — saga IDs are generated fresh
    /// per request and should never collide.
    pub fn register(&self, snapshot: SagaSnapshot) -> Result<(), RegistryError> {
        if self.sagas.contains_key(&snapshot.saga_id) {
            return Err(RegistryError::AlreadyRegistered(snapshot.saga_id));
        }
        self.sagas.insert(snapshot.saga_id, snapshot);
        Ok(())
    }

    /// Overwrites a saga's snapshot with its latest state. Used by the
    /// owning task after every transition so readers see up-to-date data.
    pub fn update(&self, snapshot: SagaSnapshot) {
        self.sagas.insert(snapshot.saga_id, snapshot);
    }

    pub fn get(&self, saga_id: SagaId) -> Result<SagaSnapshot, RegistryError> {
        self.sagas
            .get(&saga_id)
            .map(|entry| entry.value().clone())
            .ok_or(RegistryError::NotFound(saga_id))
    }

    pub fn list(&self) -> Vec<SagaSnapshot> {
        self.sagas.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Removes a saga from the registry. Retention policy is left entirely
    /// to the caller; the registry applies none of its own.
    pub fn evict(&self, saga_id: SagaId) -> Result<(), RegistryError> {
        self.sagas
            .remove(&saga_id)
            .map(|_| ())
            .ok_or(RegistryError::NotFound(saga_id))
    }

    pub fn statistics(&self) -> SagaStatistics {
        let mut status_breakdown: HashMap<SagaStatus, usize> = HashMap::new();
        let mut total_steps = 0usize;
        let mut completed_steps = 0usize;
        let mut total_active = 0usize;

        for entry in self.sagas.iter() {
            let snapshot = entry.value();
            total_active += 1;
            *status_breakdown.entry(snapshot.status).or_insert(0) += 1;
            total_steps += snapshot.steps.len();
            completed_steps += snapshot
                .steps
                .iter()
                .filter(|step| {
                    matches!(
                        step.status,
                        saga_engine::StepStatus::Succeeded | saga_engine::StepStatus::Compensated
                    )
                })
                .count();
        }

        let step_completion_rate = if total_steps == 0 {
            0.0
        } else {
            completed_steps as f64 / total_steps as f64
        };
        let average_steps_per_saga = if total_active == 0 {
            0.0
        } else {
            total_steps as f64 / total_active as f64
        };

        SagaStatistics {
            total_active,
            status_breakdown,
            total_steps,
            completed_steps,
            step_completion_rate,
            average_steps_per_saga,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_engine::{SagaContext, SagaRun};

    fn snapshot_with_status(status: SagaStatus) -> SagaSnapshot {
        let mut run = SagaRun::new(SagaId::new(), vec![], SagaContext::new());
        run.status = status;
        run.to_snapshot()
    }

    #[test]
    fn register_then_get_round_trips() {
        let registry = SagaRegistry::new();
        let snapshot = snapshot_with_status(SagaStatus::Started);
        let saga_id = snapshot.saga_id;
        registry.register(snapshot).unwrap();

        let fetched = registry.get(saga_id).unwrap();
        assert_eq!(fetched.saga_id, saga_id);
    }

    #[test]
    fn registering_the_same_id_twice_is_an_error() {
        let registry = SagaRegistry::new();
        let snapshot = snapshot_with_status(SagaStatus::Started);
        let saga_id = snapshot.saga_id;
        registry.register(snapshot.clone()).unwrap();

        let err = registry.register(snapshot).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(id) if id == saga_id));
    }

    #[test]
    fn get_on_unknown_id_is_not_found() {
        let registry = SagaRegistry::new();
        let err = registry.get(SagaId::new()).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn evict_removes_from_list() {
        let registry = SagaRegistry::new();
        let snapshot = snapshot_with_status(SagaStatus::Completed);
        let saga_id = snapshot.saga_id;
        registry.register(snapshot).unwrap();

        registry.evict(saga_id).unwrap();
        assert!(registry.list().is_empty());
        assert!(matches!(registry.evict(saga_id).unwrap_err(), RegistryError::NotFound(_)));
    }

    #[test]
    fn statistics_are_consistent_with_registered_sagas() {
        let registry = SagaRegistry::new();
        registry.register(snapshot_with_status(SagaStatus::Started)).unwrap();
        registry.register(snapshot_with_status(SagaStatus::Completed)).unwrap();
        registry.register(snapshot_with_status(SagaStatus::Failed)).unwrap();

        let stats = registry.statistics();
        assert_eq!(stats.total_active, 3);
        assert_eq!(stats.status_breakdown.get(&SagaStatus::Started), Some(&1));
        assert_eq!(stats.status_breakdown.get(&SagaStatus::Completed), Some(&1));
        assert_eq!(stats.status_breakdown.get(&SagaStatus::Failed), Some(&1));
        assert_eq!(
            stats.status_breakdown.values().sum::<usize>(),
            stats.total_active
        );
    }
}
