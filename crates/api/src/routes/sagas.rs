//! Saga inspection and supervision: list, get, abort, statistics.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::SagaId;
use registry::SagaStatistics;
use saga_engine::SagaSnapshot;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

/// GET /api/coordinator/sagas — every saga snapshot currently held.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<SagaSnapshot>> {
    Json(state.registry.list())
}

/// GET /api/coordinator/sagas/{id} — one saga's snapshot, or 404.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SagaSnapshot>, ApiError> {
    let saga_id = parse_saga_id(&id)?;
    let snapshot = state.registry.get(saga_id)?;
    Ok(Json(snapshot))
}

#[derive(Serialize)]
pub struct AbortAcceptedResponse {
    pub saga_id: String,
    pub status: &'static str,
}

/// DELETE /api/coordinator/sagas/{id} — requests abort of a running saga.
///
/// Cancellation is cooperative (§5/§9): the engine only samples the token
/// between steps, so this returns as soon as the request is recorded, not
/// once the saga has actually reached ABORTED.
pub async fn abort(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AbortAcceptedResponse>, ApiError> {
    let saga_id = parse_saga_id(&id)?;
    state.coordinator.abort(saga_id)?;
    Ok(Json(AbortAcceptedResponse {
        saga_id: saga_id.to_string(),
        status: "abort_requested",
    }))
}

/// GET /api/coordinator/statistics — aggregate statistics over every saga
/// the registry currently holds, per §4.4.
pub async fn statistics(State(state): State<Arc<AppState>>) -> Json<SagaStatistics> {
    Json(state.registry.statistics())
}

fn parse_saga_id(id: &str) -> Result<SagaId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid saga id: {id}")))
}
