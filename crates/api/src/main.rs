use std::sync::Arc;
use std::time::Duration;

use gigboard_infra::{DocumentStore, InMemoryDocumentStore, SchedulerConfig, TaskRunner};

#[tokio::main]
async fn main() {
    gigboard_observability::init();

    let bind = std::env::var("GIGBOARD_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let config = scheduler_config_from_env();

    // Store construction may block (connection + schema check).
    let store = tokio::task::spawn_blocking(build_store)
        .await
        .expect("store construction panicked");

    let runner = Arc::new(TaskRunner::new(store.clone()));
    let _scheduler = gigboard_infra::start_scheduler(runner, config);

    let app = gigboard_api::app::build_app(store);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

fn build_store() -> Arc<dyn DocumentStore> {
    #[cfg(feature = "postgres")]
    if let Ok(url) = std::env::var("GIGBOARD_DATABASE_URL") {
        match gigboard_infra::PostgresDocumentStore::connect(&url) {
            Ok(store) => return Arc::new(store),
            Err(err) => {
                tracing::warn!(error = %err, "postgres connection failed; falling back to in-memory store");
            }
        }
    }

    tracing::warn!("using in-memory document store; data will not survive a restart");
    InMemoryDocumentStore::arc()
}

fn scheduler_config_from_env() -> SchedulerConfig {
    let mut config = SchedulerConfig::default();

    if let Some(secs) = env_u64("GIGBOARD_TICK_SECS") {
        config.lifecycle_interval = Duration::from_secs(secs);
    }
    if let Some(hour) = env_u64("GIGBOARD_FIXED_HOUR_UTC") {
        config.fixed_hour_utc = (hour % 24) as u32;
    }

    config
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable env var");
            None
        }
    }
}
