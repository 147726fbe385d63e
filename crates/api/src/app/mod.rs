//! HTTP application wiring (Axum router + service wiring).
//!
//! The surface is deliberately small: a health probe and the out-of-band
//! operational triggers. Store calls are synchronous, so handlers bridge
//! through `spawn_blocking`; that keeps the sync store trait usable from
//! both the scheduler threads and this async edge.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use gigboard_infra::{DocumentStore, InMemoryDocumentStore, TaskRunner};

pub mod errors;
pub mod routes;

/// Shared handles injected into request handlers.
pub struct AppServices {
    pub store: Arc<dyn DocumentStore>,
    pub runner: TaskRunner<Arc<dyn DocumentStore>>,
}

impl AppServices {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            runner: TaskRunner::new(store.clone()),
            store,
        }
    }
}

/// Build the HTTP router over an injected store handle (public entrypoint
/// used by `main.rs` and the black-box tests).
pub fn build_app(store: Arc<dyn DocumentStore>) -> Router {
    let services = Arc::new(AppServices::new(store));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/ops/activate", post(routes::ops::activate))
        .route("/ops/tick", post(routes::ops::tick))
        .route("/ops/errors", get(routes::ops::recent_errors))
        .layer(Extension(services))
}

/// Router over a fresh in-memory store (dev default).
pub fn build_app_in_memory() -> Router {
    build_app(InMemoryDocumentStore::arc())
}
