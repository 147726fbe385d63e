//! The job lifecycle engine.
//!
//! Orchestrates the periodic transitions over the staged and live
//! collections: activation (a move, not a copy), deadline expiry, ending-soon
//! flagging, and the derived notifications. Every operation is
//! query-then-batch; each batch commits atomically, and a failed batch leaves
//! the store unchanged so the next tick can safely retry.

use tracing::debug;

use gigboard_core::{JobId, Timestamp};
use gigboard_jobs::{resolve_start, ActiveJob, JobStatus, StagedJob};
use gigboard_notifications::Notification;

use crate::collections::{self, decode};
use crate::document_store::{DocumentId, DocumentStore, FieldFilter, Query, WriteBatch};
use crate::task::TaskError;

/// Lifecycle transitions over the document store.
pub struct LifecycleEngine<S> {
    store: S,
}

impl<S: DocumentStore> LifecycleEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Move every staged job whose resolved start has arrived into the live
    /// collection.
    ///
    /// All moves of one invocation commit as a single atomic batch: either
    /// every due job is activated or none are. Zero eligible jobs is not an
    /// error, and re-running without time passing is a no-op.
    pub fn activate_staged_jobs(&self) -> Result<usize, TaskError> {
        let now = Timestamp::now();
        let staged = self.store.query(collections::STAGED_JOBS, &Query::all())?;

        let mut batch = WriteBatch::new();
        let mut activated = 0;
        for doc in &staged {
            let Some(job) = decode::<StagedJob>(collections::STAGED_JOBS, doc) else {
                continue;
            };
            let Some(start) = resolve_start(&job.kind, now) else {
                continue;
            };
            if start > now {
                continue;
            }

            let staged_id = JobId::from_uuid(*doc.id.as_uuid());
            let live = ActiveJob::from_staged(job, staged_id, now);
            batch.set(collections::JOBS, DocumentId::new(), serde_json::to_value(&live)?);
            batch.delete(collections::STAGED_JOBS, doc.id);
            activated += 1;
        }

        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        debug!(count = activated, "staged job activation pass complete");
        Ok(activated)
    }

    /// Close every live job whose deadline has passed, in place.
    ///
    /// The terminal status is variant-correct; `expired_at` is stamped once
    /// because already-terminal jobs are skipped.
    pub fn cleanup_expired_jobs(&self) -> Result<usize, TaskError> {
        let now = Timestamp::now();
        let due = self.store.query(
            collections::JOBS,
            &Query::filter(FieldFilter::lte("deadline", now.canonical())),
        )?;

        let mut batch = WriteBatch::new();
        let mut closed = 0;
        for doc in &due {
            let Some(job) = decode::<ActiveJob>(collections::JOBS, doc) else {
                continue;
            };
            if job.status.is_terminal() {
                continue;
            }

            let mut fields = serde_json::Map::new();
            fields.insert("status".to_string(), serde_json::to_value(job.terminal_status())?);
            fields.insert("expired_at".to_string(), serde_json::to_value(now)?);
            fields.insert("last_updated".to_string(), serde_json::to_value(now)?);
            batch.update(collections::JOBS, doc.id, fields);
            closed += 1;
        }

        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        debug!(count = closed, "expired job cleanup pass complete");
        Ok(closed)
    }

    /// Flag active jobs whose deadline is strictly in the future but within
    /// 24 hours as ending-soon.
    ///
    /// Jobs whose deadline already passed are excluded here; cleanup handles
    /// them.
    pub fn update_job_statuses(&self) -> Result<usize, TaskError> {
        let now = Timestamp::now();
        let active = self.store.query(
            collections::JOBS,
            &Query::filter(FieldFilter::eq("status", JobStatus::Active.as_str())),
        )?;

        let mut batch = WriteBatch::new();
        let mut flagged = 0;
        for doc in &active {
            let Some(job) = decode::<ActiveJob>(collections::JOBS, doc) else {
                continue;
            };
            if !job.is_ending_soon(now) {
                continue;
            }

            let mut fields = serde_json::Map::new();
            fields.insert("status".to_string(), serde_json::to_value(JobStatus::EndingSoon)?);
            fields.insert("last_updated".to_string(), serde_json::to_value(now)?);
            batch.update(collections::JOBS, doc.id, fields);
            flagged += 1;
        }

        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        debug!(count = flagged, "ending-soon flagging pass complete");
        Ok(flagged)
    }

    /// Create one ending-soon notification per flagged job for its owner.
    ///
    /// The whole batch commits or the run fails; there is no per-record
    /// idempotency guarantee.
    pub fn send_scheduled_notifications(&self) -> Result<usize, TaskError> {
        let now = Timestamp::now();
        let ending = self.store.query(
            collections::JOBS,
            &Query::filter(FieldFilter::eq("status", JobStatus::EndingSoon.as_str())),
        )?;

        let mut batch = WriteBatch::new();
        let mut sent = 0;
        for doc in &ending {
            let Some(job) = decode::<ActiveJob>(collections::JOBS, doc) else {
                continue;
            };

            let notification = Notification::job_ending_soon(&job, now);
            batch.set(
                collections::NOTIFICATIONS,
                DocumentId::new(),
                serde_json::to_value(&notification)?,
            );
            sent += 1;
        }

        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        debug!(count = sent, "ending-soon notification pass complete");
        Ok(sent)
    }
}
