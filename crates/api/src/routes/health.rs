//! Coordinator and participant health.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::Participant;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub participants: HashMap<Participant, bool>,
}

/// GET /api/coordinator/health — overall status plus per-participant
/// reachability, probed live via the shared communicator.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let participants = state.communicator.probe_all().await;
    let status = if participants.values().all(|&reachable| reachable) {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status, participants })
}
