//! Tracing/logging initialization.
//!
//! Structured JSON logs, filterable via `RUST_LOG`. Scheduler workers and the
//! task runner log with `task`/`run` fields so a run id correlates one tick's
//! records across tasks.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
