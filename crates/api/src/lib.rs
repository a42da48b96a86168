//! Operator-facing HTTP surface for the saga orchestration core.
//!
//! Wires the generic [`saga_engine`]/[`communicator`]/[`registry`] crates and
//! the concrete [`order_saga`] workflow behind the routes of §6, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use communicator::{DiscoveryOverrides, ServiceCommunicator};
use metrics_exporter_prometheus::PrometheusHandle;
use order_saga::OrderSagaCoordinator;
use registry::SagaRegistry;
use saga_engine::SagaEngine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from every handler.
pub struct AppState {
    pub communicator: ServiceCommunicator,
    pub coordinator: Arc<OrderSagaCoordinator>,
    pub registry: Arc<SagaRegistry>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/api/coordinator/health", get(routes::health::check))
        .route("/api/coordinator/sagas", get(routes::sagas::list))
        .route("/api/coordinator/sagas/{id}", get(routes::sagas::get))
        .route("/api/coordinator/sagas/{id}", delete(routes::sagas::abort))
        .route("/api/coordinator/orders", post(routes::orders::create))
        .route("/api/coordinator/statistics", get(routes::sagas::statistics))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: a communicator with participant
/// addresses resolved from the environment, a fresh in-memory registry, and
/// a coordinator wiring the two together through the generic saga engine.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    let communicator = ServiceCommunicator::new(
        DiscoveryOverrides::new(),
        config.retry_policy(),
        config.request_timeout,
    );
    let registry = Arc::new(SagaRegistry::new());
    let engine = SagaEngine::new(communicator.clone());
    let coordinator = Arc::new(OrderSagaCoordinator::new(engine, registry.clone()));

    Arc::new(AppState {
        communicator,
        coordinator,
        registry,
    })
}
