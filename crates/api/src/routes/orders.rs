//! Order intake: starts a new order-fulfillment saga.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use order_saga::request::OrderRequest;
use saga_engine::SagaSnapshot;

use crate::AppState;
use crate::error::ApiError;

/// POST /api/coordinator/orders — accepts an order request, runs the
/// five-step saga to completion, and returns its terminal snapshot
/// (saga_id, status, failed_step_index, execution_log, context).
///
/// Per §5, the saga itself runs in its own `tokio::spawn`-ed task so one
/// slow/blocked saga cannot hold up the worker handling a concurrent
/// request; this handler awaits only the saga it started.
#[tracing::instrument(skip(state, request))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<SagaSnapshot>, ApiError> {
    let coordinator = state.coordinator.clone();
    let snapshot = tokio::spawn(async move { coordinator.start(request).await })
        .await
        .expect("saga task panicked");

    Ok(Json(snapshot))
}
