//! Daily and weekly aggregation over the document store.
//!
//! Both tasks are read-then-append (plus a batched field update for the
//! weekly application recount). Neither ever mutates a job's `status`;
//! retention cleanup targets notifications only.

use tracing::debug;

use gigboard_analytics::{daily_snapshot, weekly_report};
use gigboard_core::Timestamp;
use gigboard_jobs::{ActiveJob, StagedJob};
use gigboard_notifications::{Notification, RETENTION_DAYS};

use crate::collections::{self, decode};
use crate::document_store::{DocumentStore, FieldFilter, Query, WriteBatch};
use crate::task::TaskError;

/// Scheduled rollups and retention cleanup.
pub struct AnalyticsAggregator<S> {
    store: S,
}

impl<S: DocumentStore> AnalyticsAggregator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load_jobs(&self) -> Result<(Vec<StagedJob>, Vec<ActiveJob>), TaskError> {
        let staged = self
            .store
            .query(collections::STAGED_JOBS, &Query::all())?
            .iter()
            .filter_map(|doc| decode(collections::STAGED_JOBS, doc))
            .collect();
        let live = self
            .store
            .query(collections::JOBS, &Query::all())?
            .iter()
            .filter_map(|doc| decode(collections::JOBS, doc))
            .collect();
        Ok((staged, live))
    }

    /// Append one daily snapshot, then prune read notifications past the
    /// retention window. Returns the number of pruned notifications.
    pub fn run_daily(&self) -> Result<usize, TaskError> {
        let now = Timestamp::now();
        let (staged, live) = self.load_jobs()?;

        let snapshot = daily_snapshot(&staged, &live, now);
        self.store
            .insert(collections::ANALYTICS_SNAPSHOTS, serde_json::to_value(&snapshot)?)?;
        debug!(
            jobs_created = snapshot.jobs_created,
            jobs_closed = snapshot.jobs_closed,
            active_jobs = snapshot.active_jobs,
            "daily snapshot appended"
        );

        // Read + past retention: delete. Unread old notifications stay.
        let cutoff = now - chrono::Duration::days(RETENTION_DAYS);
        let stale = self.store.query(
            collections::NOTIFICATIONS,
            &Query::filter(FieldFilter::eq("read", true))
                .and(FieldFilter::lt("created_at", cutoff.canonical())),
        )?;

        let mut batch = WriteBatch::new();
        for doc in &stale {
            // The range filter already decided; decoding is a belt check so a
            // malformed record is skipped instead of deleted.
            if decode::<Notification>(collections::NOTIFICATIONS, doc).is_none() {
                continue;
            }
            batch.delete(collections::NOTIFICATIONS, doc.id);
        }
        let pruned = batch.len();
        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        debug!(count = pruned, "notification retention pass complete");
        Ok(pruned)
    }

    /// Recompute derived application counts for open jobs carrying an
    /// applicant list, then append the weekly creation report. Returns the
    /// number of recounted jobs.
    pub fn run_weekly(&self) -> Result<usize, TaskError> {
        let now = Timestamp::now();
        let live_docs = self.store.query(collections::JOBS, &Query::all())?;

        let mut batch = WriteBatch::new();
        let mut recounted = 0;
        for doc in &live_docs {
            let Some(job) = decode::<ActiveJob>(collections::JOBS, doc) else {
                continue;
            };
            if !job.status.is_open() {
                continue;
            }
            let Some(applicants) = &job.applicants else {
                continue;
            };

            let count = applicants.len() as u32;
            if job.application_count == Some(count) {
                continue;
            }

            let mut fields = serde_json::Map::new();
            fields.insert("application_count".to_string(), serde_json::to_value(count)?);
            fields.insert("last_updated".to_string(), serde_json::to_value(now)?);
            batch.update(collections::JOBS, doc.id, fields);
            recounted += 1;
        }
        if !batch.is_empty() {
            self.store.commit(batch)?;
        }

        let (staged, live) = self.load_jobs()?;
        let report = weekly_report(&staged, &live, now);
        self.store
            .insert(collections::REPORTS, serde_json::to_value(&report)?)?;
        debug!(
            recounted,
            jobs_created = report.jobs_created.total(),
            "weekly report appended"
        );
        Ok(recounted)
    }
}
