//! Task runner and error sink.
//!
//! Invokes the named tasks of a run in fixed order with a shared run id. A
//! failing task is recorded and never blocks the tasks after it; the run
//! report goes back to the invoker regardless. Persisting an error record is
//! itself best-effort.

use std::time::Instant;

use tracing::{error, info, warn};

use gigboard_core::{RunId, Timestamp};

use crate::aggregator::AnalyticsAggregator;
use crate::collections;
use crate::document_store::DocumentStore;
use crate::lifecycle::LifecycleEngine;
use crate::task::{ErrorRecord, RunReport, TaskError, TaskKind, TaskOutcome, LIFECYCLE_TICK};

/// Executes scheduled tasks against one store handle.
pub struct TaskRunner<S> {
    store: S,
    engine: LifecycleEngine<S>,
    aggregator: AnalyticsAggregator<S>,
}

impl<S: DocumentStore + Clone> TaskRunner<S> {
    pub fn new(store: S) -> Self {
        Self {
            engine: LifecycleEngine::new(store.clone()),
            aggregator: AnalyticsAggregator::new(store.clone()),
            store,
        }
    }

    /// One lifecycle tick: activate → cleanup → flag ending-soon → notify.
    pub fn run_lifecycle_tick(&self, run_id: RunId) -> RunReport {
        self.run_tasks(run_id, &LIFECYCLE_TICK)
    }

    pub fn run_daily(&self, run_id: RunId) -> RunReport {
        self.run_tasks(run_id, &[TaskKind::DailyAnalytics])
    }

    pub fn run_weekly(&self, run_id: RunId) -> RunReport {
        self.run_tasks(run_id, &[TaskKind::WeeklyMaintenance])
    }

    /// Run a single named task out-of-band (manual/operational triggers).
    pub fn run_task(&self, task: TaskKind, run_id: RunId) -> RunReport {
        self.run_tasks(run_id, &[task])
    }

    fn run_tasks(&self, run_id: RunId, tasks: &[TaskKind]) -> RunReport {
        let started_at = Timestamp::now();
        let started = Instant::now();

        let outcomes = tasks
            .iter()
            .map(|task| {
                let result = self.execute(*task);
                match &result {
                    Ok(count) => {
                        info!(task = task.name(), run = %run_id, count, "task completed");
                    }
                    Err(err) => {
                        error!(task = task.name(), run = %run_id, error = %err, "task failed");
                        self.record_failure(*task, run_id, err);
                    }
                }
                TaskOutcome { task: *task, result }
            })
            .collect();

        RunReport {
            run_id,
            started_at,
            duration: started.elapsed(),
            outcomes,
        }
    }

    fn execute(&self, task: TaskKind) -> Result<usize, TaskError> {
        match task {
            TaskKind::ActivateStagedJobs => self.engine.activate_staged_jobs(),
            TaskKind::CleanupExpiredJobs => self.engine.cleanup_expired_jobs(),
            TaskKind::UpdateJobStatuses => self.engine.update_job_statuses(),
            TaskKind::SendScheduledNotifications => self.engine.send_scheduled_notifications(),
            TaskKind::DailyAnalytics => self.aggregator.run_daily(),
            TaskKind::WeeklyMaintenance => self.aggregator.run_weekly(),
        }
    }

    // Best-effort: a failure to persist the record must not escalate.
    fn record_failure(&self, task: TaskKind, run_id: RunId, err: &TaskError) {
        let record = ErrorRecord::new(task, run_id, err);
        match serde_json::to_value(&record) {
            Ok(data) => {
                if let Err(write_err) = self.store.insert(collections::TASK_ERRORS, data) {
                    warn!(
                        task = task.name(),
                        run = %run_id,
                        error = %write_err,
                        "failed to persist error record"
                    );
                }
            }
            Err(encode_err) => {
                warn!(
                    task = task.name(),
                    run = %run_id,
                    error = %encode_err,
                    "failed to encode error record"
                );
            }
        }
    }
}
