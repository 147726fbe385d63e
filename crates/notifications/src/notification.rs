use chrono::Duration;
use serde::{Deserialize, Serialize};

use gigboard_core::{JobId, Timestamp, UserId};
use gigboard_jobs::ActiveJob;

/// How long a read notification is retained before daily cleanup deletes it.
pub const RETENTION_DAYS: i64 = 30;

/// Notification type tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    JobEndingSoon,
}

/// An ephemeral record owned by its target user.
///
/// The engine only creates, reads, and deletes these; content is never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Notification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub job_id: JobId,
    pub created_at: Timestamp,
    pub read: bool,
}

impl Notification {
    /// Derive the "ending soon" notification for a live job's owner.
    ///
    /// Both the variant name and the job's display title appear verbatim in
    /// the templated text.
    pub fn job_ending_soon(job: &ActiveJob, now: Timestamp) -> Self {
        let variant = job.kind.variant().display_name();
        Self {
            user_id: job.created_by,
            kind: NotificationKind::JobEndingSoon,
            title: format!("{variant} ending soon"),
            message: format!(
                "Your {variant} \"{}\" closes within 24 hours.",
                job.title
            ),
            job_id: job.job_id,
            created_at: now,
            read: false,
        }
    }

    /// Retention rule for daily cleanup: deleted only when read AND older
    /// than the retention window. Unread notifications are kept regardless
    /// of age.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.read && self.created_at < now - Duration::days(RETENTION_DAYS)
    }
}
