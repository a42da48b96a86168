use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::SagaId;
use communicator::{CommError, HttpMethod, ServiceCommunicator};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::SagaError;
use crate::model::{ExecutionLogEntry, Outcome, Phase, SagaRun, SagaStatus, StepStatus};

/// Hook invoked after every state transition with a read-only snapshot of
/// the saga, for a future durable saga log to observe. Unset by default —
/// this binary keeps saga state in process memory only.
pub type TransitionHook = Arc<dyn Fn(&SagaRun) + Send + Sync>;

/// Runs a [`SagaRun`]'s steps against its communicator: sequential forward
/// execution, with reverse-order compensation the moment a step fails or
/// the caller cancels.
///
/// Stateless and cheap to clone — it holds no saga data itself, only the
/// communicator and the optional transition hook, so one engine instance
/// can drive any number of concurrently running sagas.
#[derive(Clone)]
pub struct SagaEngine {
    communicator: ServiceCommunicator,
    on_transition: Option<TransitionHook>,
}

/// Outcome of a saga's forward execution, once it has either completed,
/// failed, or been aborted.
pub struct ExecutionResult {
    pub saga_id: SagaId,
    pub status: SagaStatus,
    pub succeeded_step_count: usize,
    pub failed_step_index: Option<usize>,
    pub compensated_step_count: usize,
    pub execution_log: Vec<ExecutionLogEntry>,
}

/// Outcome of a compensation sweep.
pub struct CompensationResult {
    pub compensated_count: usize,
    pub compensation_failed_count: usize,
}

impl SagaEngine {
    pub fn new(communicator: ServiceCommunicator) -> Self {
        Self {
            communicator,
            on_transition: None,
        }
    }

    pub fn with_transition_hook(mut self, hook: TransitionHook) -> Self {
        self.on_transition = Some(hook);
        self
    }

    fn notify(&self, run: &SagaRun) {
        if let Some(hook) = &self.on_transition {
            hook(run);
        }
    }

    /// Runs `run`'s steps forward in order, compensating already-succeeded
    /// steps the moment one fails or `cancel` is observed between steps.
    ///
    /// Precondition: `run.status == Started` and no step has begun.
    #[tracing::instrument(skip(self, run, cancel), fields(saga_id = %run.saga_id))]
    pub async fn execute(
        &self,
        run: &mut SagaRun,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult, SagaError> {
        if run.status != SagaStatus::Started {
            return Err(SagaError::NotStarted(run.saga_id));
        }

        metrics::counter!("saga_executions_total").increment(1);
        let saga_started = Instant::now();
        let mut compensation = CompensationResult { compensated_count: 0, compensation_failed_count: 0 };

        for index in 0..run.steps.len() {
            if cancel.is_cancelled() {
                tracing::info!(step_index = index, "saga aborted before step started");
                run.status = SagaStatus::Aborted;
                self.notify(run);
                compensation = self.compensate(run, index).await?;
                break;
            }

            self.run_forward_step(run, index).await;

            match run.steps[index].status {
                StepStatus::Succeeded => continue,
                StepStatus::Failed => {
                    run.failed_step_index = Some(index);
                    run.status = SagaStatus::Failed;
                    self.notify(run);
                    // `index + 1` so a step that itself ends in business
                    // refusal is considered by the sweep below too — see
                    // `compensate_on_business_refusal`.
                    compensation = self.compensate(run, index + 1).await?;
                    break;
                }
                _ => unreachable!("run_forward_step always leaves Succeeded or Failed"),
            }
        }

        if run.status == SagaStatus::Started {
            run.status = SagaStatus::Completed;
            self.notify(run);
            metrics::counter!("saga_completed_total").increment(1);
        } else {
            metrics::counter!("saga_failed_total").increment(1);
        }
        metrics::histogram!("saga_duration_seconds").record(saga_started.elapsed().as_secs_f64());

        let succeeded_step_count = run
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Succeeded || s.status == StepStatus::Compensated)
            .count();

        Ok(ExecutionResult {
            saga_id: run.saga_id,
            status: run.status,
            succeeded_step_count,
            failed_step_index: run.failed_step_index,
            compensated_step_count: compensation.compensated_count,
            execution_log: run.execution_log.clone(),
        })
    }

    async fn run_forward_step(&self, run: &mut SagaRun, index: usize) {
        let participant = run.steps[index].definition.participant;
        let started_at = Utc::now();
        let t0 = Instant::now();

        run.steps[index].status = StepStatus::InFlight;
        let payload = inject_saga_id(run.saga_id, (run.steps[index].definition.payload_builder)(&run.context));
        run.steps[index].request_data = Some(payload.clone());

        let endpoint = render_endpoint(&run.steps[index].definition.action_endpoint, &run.context);
        let timeout = run.steps[index].definition.timeout;

        let call_result = self
            .communicator
            .send(participant, &endpoint, HttpMethod::Post, Some(&payload), timeout)
            .await;

        let (outcome, error_kind, error_detail) = match call_result {
            Ok(response) => {
                if response_is_ok(&response) {
                    let fragment = (run.steps[index].definition.response_merger)(&response, &run.context);
                    run.context.merge(fragment);
                    run.steps[index].response_data = Some(response);
                    run.steps[index].status = StepStatus::Succeeded;
                    (Outcome::Success, None, None)
                } else {
                    let reason = business_refusal_reason(&response);
                    run.steps[index].error = Some(reason.clone());
                    // Kept even on refusal: a partial side effect (e.g. a
                    // partial inventory reservation) may still need releasing.
                    run.steps[index].response_data = Some(response);
                    run.steps[index].status = StepStatus::Failed;
                    (Outcome::Failure, Some("business_refusal".to_string()), Some(reason))
                }
            }
            Err(err) => {
                let kind = comm_error_kind(&err).to_string();
                let detail = err.to_string();
                run.steps[index].error = Some(detail.clone());
                run.steps[index].status = StepStatus::Failed;
                (Outcome::Failure, Some(kind), Some(detail))
            }
        };

        let finished_at = Utc::now();
        run.execution_log.push(ExecutionLogEntry {
            step_index: index,
            participant,
            phase: Phase::Forward,
            outcome,
            started_at,
            finished_at,
            elapsed: t0.elapsed(),
            error_kind,
            error_detail,
        });
    }

    /// Compensates every step that succeeded strictly before `from_index`,
    /// in reverse order. Never transitions `run.status` to `Completed`;
    /// called internally on forward failure and on cancellation, but also
    /// exposed for callers driving an external abort directly.
    pub async fn compensate(
        &self,
        run: &mut SagaRun,
        from_index: usize,
    ) -> Result<CompensationResult, SagaError> {
        if from_index > run.steps.len() {
            return Err(SagaError::CompensationIndexOutOfRange {
                index: from_index,
                step_count: run.steps.len(),
            });
        }

        let mut compensated_count = 0;
        let mut compensation_failed_count = 0;

        for index in (0..from_index).rev() {
            let eligible = match run.steps[index].status {
                StepStatus::Succeeded => true,
                StepStatus::Failed => {
                    run.steps[index].definition.compensate_on_business_refusal
                        && run.steps[index].response_data.is_some()
                }
                _ => false,
            };
            if !eligible {
                continue;
            }

            let participant = run.steps[index].definition.participant;
            let endpoint = render_endpoint(&run.steps[index].definition.compensation_endpoint, &run.context);
            let timeout = run.steps[index].definition.timeout;
            let request_data = run.steps[index].request_data.clone();
            let response_data = run.steps[index].response_data.clone();

            let mut payload = run.context.as_map().clone();
            payload.insert("original_request".to_string(), request_data.unwrap_or(Value::Null));
            payload.insert("original_response".to_string(), response_data.unwrap_or(Value::Null));
            let payload = inject_saga_id(run.saga_id, Value::Object(payload));

            let started_at = Utc::now();
            let t0 = Instant::now();
            let result = self
                .communicator
                .send(participant, &endpoint, HttpMethod::Post, Some(&payload), timeout)
                .await;
            let finished_at = Utc::now();

            let (outcome, error_kind, error_detail) = match result {
                Ok(_) => {
                    run.steps[index].status = StepStatus::Compensated;
                    compensated_count += 1;
                    (Outcome::Success, None, None)
                }
                Err(err) => {
                    tracing::warn!(step_index = index, %participant, error = %err, "compensation failed");
                    run.steps[index].status = StepStatus::CompensationFailed;
                    compensation_failed_count += 1;
                    (Outcome::Failure, Some(comm_error_kind(&err).to_string()), Some(err.to_string()))
                }
            };

            run.execution_log.push(ExecutionLogEntry {
                step_index: index,
                participant,
                phase: Phase::Compensation,
                outcome,
                started_at,
                finished_at,
                elapsed: t0.elapsed(),
                error_kind,
                error_detail,
            });
        }

        self.notify(run);
        Ok(CompensationResult { compensated_count, compensation_failed_count })
    }
}

/// Resolves `{key}` placeholders in an endpoint template against the
/// current context, e.g. `/api/orders/{order_id}/cancel` with
/// `order_id = "o-1"` becomes `/api/orders/o-1/cancel`. Templates with no
/// placeholders are returned unchanged. An unresolvable key is substituted
/// with an empty string rather than panicking — a malformed path is a
/// communicator-level 404, not a crash.
fn render_endpoint(template: &str, context: &crate::context::SagaContext) -> String {
    if !template.contains('{') {
        return template.to_string();
    }

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        rest = &rest[start + 1..];
        let Some(end) = rest.find('}') else {
            rendered.push('{');
            rendered.push_str(rest);
            rest = "";
            break;
        };
        let key = &rest[..end];
        let value = context
            .get(key)
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        rendered.push_str(&value);
        rest = &rest[end + 1..];
    }
    rendered.push_str(rest);
    rendered
}

/// Stamps every outgoing request with `saga_id`, per the wire envelope in
/// §6 — a generic concern the engine handles so no step builder has to.
fn inject_saga_id(saga_id: SagaId, payload: Value) -> Value {
    match payload {
        Value::Object(mut map) => {
            map.insert("saga_id".to_string(), Value::String(saga_id.to_string()));
            Value::Object(map)
        }
        other => other,
    }
}

fn response_is_ok(response: &Value) -> bool {
    response.get("ok").and_then(Value::as_bool).unwrap_or(true)
}

fn business_refusal_reason(response: &Value) -> String {
    response
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("participant refused the request")
        .to_string()
}

fn comm_error_kind(err: &CommError) -> &'static str {
    match err {
        CommError::UnknownParticipant(_) => "unknown_participant",
        CommError::ConnectFailed { .. } => "connect_failed",
        CommError::Timeout { .. } => "timeout",
        CommError::BadStatus { .. } => "bad_status",
        CommError::DecodeError { .. } => "decode_error",
        CommError::RetriesExhausted { .. } => "retries_exhausted",
    }
}
