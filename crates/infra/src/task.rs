//! Task identities, typed task failures, and run reporting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gigboard_core::{RunId, Timestamp};

use crate::document_store::DocumentStoreError;

/// The named scheduled tasks, in their fixed per-tick order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TaskKind {
    ActivateStagedJobs,
    CleanupExpiredJobs,
    UpdateJobStatuses,
    SendScheduledNotifications,
    DailyAnalytics,
    WeeklyMaintenance,
}

/// The four lifecycle tasks of one tick, in execution order: a job activated
/// this tick can be closed or flagged ending-soon in the same tick.
pub const LIFECYCLE_TICK: [TaskKind; 4] = [
    TaskKind::ActivateStagedJobs,
    TaskKind::CleanupExpiredJobs,
    TaskKind::UpdateJobStatuses,
    TaskKind::SendScheduledNotifications,
];

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::ActivateStagedJobs => "activate_staged_jobs",
            TaskKind::CleanupExpiredJobs => "cleanup_expired_jobs",
            TaskKind::UpdateJobStatuses => "update_job_statuses",
            TaskKind::SendScheduledNotifications => "send_scheduled_notifications",
            TaskKind::DailyAnalytics => "daily_analytics",
            TaskKind::WeeklyMaintenance => "weekly_maintenance",
        }
    }
}

impl core::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A task failure, visible to the runner as a value.
///
/// Continue-on-error is the runner's contract; making failures typed keeps
/// that contract explicit instead of incidental control flow.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("store operation failed: {0}")]
    Store(#[from] DocumentStoreError),

    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TaskError {
    /// Coarse classification persisted on error records.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::Store(_) => "store",
            TaskError::Encode(_) => "encode",
        }
    }
}

/// Append-only audit record of one task failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorRecord {
    pub task: String,
    pub run_id: RunId,
    pub message: String,
    pub kind: String,
    pub created_at: Timestamp,
}

impl ErrorRecord {
    pub fn new(task: TaskKind, run_id: RunId, err: &TaskError) -> Self {
        Self {
            task: task.name().to_string(),
            run_id,
            message: err.to_string(),
            kind: err.kind().to_string(),
            created_at: Timestamp::now(),
        }
    }
}

/// Outcome of one task within a run.
#[derive(Debug)]
pub struct TaskOutcome {
    pub task: TaskKind,
    /// Processed-record count on success.
    pub result: Result<usize, TaskError>,
}

impl TaskOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// What one runner invocation did.
///
/// Returned to the invoker even when sub-tasks failed; failure visibility is
/// the error-record stream, not this value.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: Timestamp,
    pub duration: std::time::Duration,
    pub outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(TaskOutcome::is_ok)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }
}
