use std::collections::HashMap;

use saga_engine::SagaStatus;
use serde::{Deserialize, Serialize};

/// Aggregate view over every saga the registry currently holds, per §4.4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaStatistics {
    pub total_active: usize,
    pub status_breakdown: HashMap<SagaStatus, usize>,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub step_completion_rate: f64,
    pub average_steps_per_saga: f64,
}
