use std::sync::Arc;

use common::SagaId;
use dashmap::DashMap;
use registry::SagaRegistry;
use saga_engine::{SagaEngine, SagaRun, SagaSnapshot};
use tokio_util::sync::CancellationToken;

use crate::context::initial_context;
use crate::definition;
use crate::error::CoordinatorError;
use crate::request::OrderRequest;

/// Wires the generic [`SagaEngine`] to the concrete order-fulfillment step
/// list and the process-wide [`SagaRegistry`].
///
/// [`start`](Self::start) drives one saga to completion and is meant to be
/// called from its own `tokio::spawn`-ed task per request (the HTTP layer
/// does the spawning, since it owns the request/response lifecycle) — many
/// sagas can be in flight on the same worker pool because every `.await`
/// inside the engine yields at the only suspension points that matter, the
/// communicator's network calls.
pub struct OrderSagaCoordinator {
    engine: SagaEngine,
    registry: Arc<SagaRegistry>,
    /// Cancellation handles for sagas currently executing, so an external
    /// abort request (DELETE /sagas/{id}) can reach the right task. Removed
    /// once the saga reaches a terminal state.
    live: DashMap<SagaId, CancellationToken>,
}

impl OrderSagaCoordinator {
    pub fn new(engine: SagaEngine, registry: Arc<SagaRegistry>) -> Self {
        Self { engine, registry, live: DashMap::new() }
    }

    /// Starts a new order-fulfillment saga and runs it to completion,
    /// returning its terminal snapshot.
    #[tracing::instrument(skip(self, request))]
    pub async fn start(&self, request: OrderRequest) -> SagaSnapshot {
        let saga_id = SagaId::new();
        let context = initial_context(&request);
        let mut run = SagaRun::new(saga_id, definition::steps(), context);

        self.registry
            .register(run.to_snapshot())
            .expect("saga ids are fresh v4 uuids and never collide");

        let cancel = CancellationToken::new();
        self.live.insert(saga_id, cancel.clone());

        self.engine.execute(&mut run, &cancel).await.expect("run is freshly started");
        let snapshot = run.to_snapshot();
        self.registry.update(snapshot.clone());
        self.live.remove(&saga_id);

        snapshot
    }

    /// Signals the saga's cancellation token. The engine honors it only at
    /// the next step boundary — a step already in flight finishes first.
    pub fn abort(&self, saga_id: SagaId) -> Result<(), CoordinatorError> {
        let token = self
            .live
            .get(&saga_id)
            .ok_or(CoordinatorError::NotRunning(saga_id))?;
        token.cancel();
        Ok(())
    }
}
