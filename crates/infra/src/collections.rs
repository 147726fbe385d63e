//! Named collections and the typed decode boundary.
//!
//! A posting exists in exactly one of the staged or live collections at any
//! time; activation moves it. Decoding is where malformed or
//! unknown-variant documents are flagged: they are logged at warn level and
//! skipped, never fatal to a run.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::document_store::Document;

/// Postings accepted but not yet activated.
pub const STAGED_JOBS: &str = "staged_jobs";
/// Live postings: open for participation or terminal.
pub const JOBS: &str = "jobs";
/// Per-user notification records.
pub const NOTIFICATIONS: &str = "notifications";
/// Daily analytics snapshots (append-only).
pub const ANALYTICS_SNAPSHOTS: &str = "analytics_snapshots";
/// Weekly reports (append-only).
pub const REPORTS: &str = "reports";
/// Task failure audit records (append-only, best-effort).
pub const TASK_ERRORS: &str = "task_errors";
/// Heartbeat writes from the health probe.
pub const HEALTH_CHECKS: &str = "health_checks";

/// Decode a document into a typed record, or skip it with a warning.
pub fn decode<T: DeserializeOwned>(collection: &str, doc: &Document) -> Option<T> {
    match serde_json::from_value(doc.data.clone()) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                collection,
                id = %doc.id,
                error = %err,
                "skipping undecodable document"
            );
            None
        }
    }
}
