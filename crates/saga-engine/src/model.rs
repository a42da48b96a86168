use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{Participant, SagaId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::SagaContext;

/// Builds the request payload for a step's forward call from the current
/// context.
pub type PayloadBuilder = Arc<dyn Fn(&SagaContext) -> Value + Send + Sync>;

/// Extracts the fragment of context a step's successful response
/// contributes, merged into the saga's context after the call returns.
pub type ResponseMerger = Arc<dyn Fn(&Value, &SagaContext) -> Map<String, Value> + Send + Sync>;

/// One forward action plus its compensating action, targeting a single
/// participant.
#[derive(Clone)]
pub struct Step {
    /// Human-readable name used in logs and snapshots, e.g. `"reserve_inventory"`.
    pub name: String,
    pub participant: Participant,
    /// May contain `{key}` placeholders resolved against the shared context
    /// at call time, e.g. `/api/orders/{order_id}/cancel`.
    pub action_endpoint: String,
    pub compensation_endpoint: String,
    pub timeout: Option<Duration>,
    pub payload_builder: PayloadBuilder,
    pub response_merger: ResponseMerger,
    /// Whether this step's own compensation endpoint should still be called
    /// when the step itself ends in business refusal (not just when an
    /// earlier step is rolled back). Some participants report a partial
    /// side effect alongside an `ok=false` response (e.g. inventory
    /// reserving some but not all requested items) that must still be
    /// released. Defaults to `false`.
    pub compensate_on_business_refusal: bool,
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        participant: Participant,
        action_endpoint: impl Into<String>,
        compensation_endpoint: impl Into<String>,
        payload_builder: PayloadBuilder,
        response_merger: ResponseMerger,
    ) -> Self {
        Self {
            name: name.into(),
            participant,
            action_endpoint: action_endpoint.into(),
            compensation_endpoint: compensation_endpoint.into(),
            timeout: None,
            payload_builder,
            response_merger,
            compensate_on_business_refusal: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Marks this step so a business refusal (`ok=false`) still triggers a
    /// call to its own compensation endpoint, using the refusal response as
    /// `original_response`.
    pub fn compensate_on_business_refusal(mut self) -> Self {
        self.compensate_on_business_refusal = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InFlight,
    Succeeded,
    Failed,
    Compensated,
    CompensationFailed,
}

/// The status of a saga as a whole, per §3's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStatus {
    Started,
    Completed,
    Failed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Forward,
    Compensation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// One append-only entry in a saga's execution log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub step_index: usize,
    pub participant: Participant,
    pub phase: Phase,
    pub outcome: Outcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub error_kind: Option<String>,
    pub error_detail: Option<String>,
}

/// A step's definition plus its runtime outcome so far.
pub struct StepRuntime {
    pub definition: Step,
    pub status: StepStatus,
    pub request_data: Option<Value>,
    pub response_data: Option<Value>,
    pub error: Option<String>,
}

impl StepRuntime {
    fn pending(definition: Step) -> Self {
        Self {
            definition,
            status: StepStatus::Pending,
            request_data: None,
            response_data: None,
            error: None,
        }
    }
}

/// A single saga's full mutable state: its step list, shared context, and
/// execution log, as tracked by the engine across `execute`/`compensate`.
pub struct SagaRun {
    pub saga_id: SagaId,
    pub status: SagaStatus,
    pub steps: Vec<StepRuntime>,
    pub context: SagaContext,
    pub execution_log: Vec<ExecutionLogEntry>,
    pub failed_step_index: Option<usize>,
}

impl SagaRun {
    pub fn new(saga_id: SagaId, steps: Vec<Step>, initial_context: SagaContext) -> Self {
        Self {
            saga_id,
            status: SagaStatus::Started,
            steps: steps.into_iter().map(StepRuntime::pending).collect(),
            context: initial_context,
            execution_log: Vec::new(),
            failed_step_index: None,
        }
    }

    pub fn to_snapshot(&self) -> SagaSnapshot {
        SagaSnapshot {
            saga_id: self.saga_id,
            status: self.status,
            steps: self
                .steps
                .iter()
                .enumerate()
                .map(|(index, step)| StepSnapshot {
                    index,
                    name: step.definition.name.clone(),
                    participant: step.definition.participant,
                    status: step.status,
                    error: step.error.clone(),
                })
                .collect(),
            context: self.context.as_map().clone(),
            execution_log: self.execution_log.clone(),
            failed_step_index: self.failed_step_index,
        }
    }
}

/// Read-only, serializable view of a [`SagaRun`] safe to hand to the
/// registry and the HTTP API — strips the non-serializable step closures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaSnapshot {
    pub saga_id: SagaId,
    pub status: SagaStatus,
    pub steps: Vec<StepSnapshot>,
    pub context: Map<String, Value>,
    pub execution_log: Vec<ExecutionLogEntry>,
    pub failed_step_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub index: usize,
    pub name: String,
    pub participant: Participant,
    pub status: StepStatus,
    pub error: Option<String>,
}
