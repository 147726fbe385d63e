use chrono::Duration;
use serde::{Deserialize, Serialize};

use gigboard_core::Timestamp;
use gigboard_jobs::{ActiveJob, JobVariant, StagedJob};

/// Job creation counts bucketed by variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCounts {
    pub contract: u64,
    pub bounty: u64,
    pub auction: u64,
    pub challenge: u64,
}

impl VariantCounts {
    pub fn bump(&mut self, variant: JobVariant) {
        match variant {
            JobVariant::Contract => self.contract += 1,
            JobVariant::Bounty => self.bounty += 1,
            JobVariant::Auction => self.auction += 1,
            JobVariant::Challenge => self.challenge += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.contract + self.bounty + self.auction + self.challenge
    }
}

/// Daily rollup: immutable, append-only, one per daily run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailySnapshot {
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    /// Postings created in the window (staged and live).
    pub jobs_created: u64,
    /// Postings that reached a terminal status with `last_updated` in window.
    pub jobs_closed: u64,
    /// Point-in-time count of currently open postings, not windowed.
    pub active_jobs: u64,
    pub created_at: Timestamp,
}

/// Weekly rollup: creation counts by variant over the trailing 7 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeeklyReport {
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub jobs_created: VariantCounts,
    pub created_at: Timestamp,
}

// Windows are half-open on the left: (start, end]. A record stamped exactly
// at the run instant counts; one stamped exactly at start belongs to the
// previous window.
fn in_window(ts: Timestamp, start: Timestamp, end: Timestamp) -> bool {
    ts > start && ts <= end
}

/// Compute the daily snapshot over the trailing 24-hour window ending `now`.
pub fn daily_snapshot(staged: &[StagedJob], live: &[ActiveJob], now: Timestamp) -> DailySnapshot {
    let window_start = now - Duration::hours(24);

    let created_staged = staged
        .iter()
        .filter(|j| in_window(j.created_at, window_start, now))
        .count() as u64;
    let created_live = live
        .iter()
        .filter(|j| in_window(j.created_at, window_start, now))
        .count() as u64;

    let jobs_closed = live
        .iter()
        .filter(|j| j.status.is_terminal() && in_window(j.last_updated, window_start, now))
        .count() as u64;

    let active_jobs = live.iter().filter(|j| j.status.is_open()).count() as u64;

    DailySnapshot {
        window_start,
        window_end: now,
        jobs_created: created_staged + created_live,
        jobs_closed,
        active_jobs,
        created_at: now,
    }
}

/// Compute the weekly report over the trailing 7-day window ending `now`.
pub fn weekly_report(staged: &[StagedJob], live: &[ActiveJob], now: Timestamp) -> WeeklyReport {
    let window_start = now - Duration::days(7);

    let mut counts = VariantCounts::default();
    for job in staged {
        if in_window(job.created_at, window_start, now) {
            counts.bump(job.kind.variant());
        }
    }
    for job in live {
        if in_window(job.created_at, window_start, now) {
            counts.bump(job.kind.variant());
        }
    }

    WeeklyReport {
        window_start,
        window_end: now,
        jobs_created: counts,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigboard_core::{JobId, UserId};
    use gigboard_jobs::{JobKind, JobStatus};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn staged(kind: JobKind, created_at: Timestamp) -> StagedJob {
        StagedJob {
            title: "t".to_string(),
            created_by: UserId::new(),
            kind,
            deadline: created_at + Duration::days(30),
            created_at,
            last_updated: created_at,
        }
    }

    fn live(kind: JobKind, created_at: Timestamp, status: JobStatus) -> ActiveJob {
        let mut job = ActiveJob::from_staged(staged(kind, created_at), JobId::new(), created_at);
        job.status = status;
        job
    }

    #[test]
    fn daily_snapshot_counts_all_three_metrics() {
        let now = ts("2024-05-02T06:00:00Z");
        let in_win = ts("2024-05-01T12:00:00Z");
        let out_win = ts("2024-04-30T12:00:00Z");

        let staged_jobs = vec![
            staged(JobKind::Challenge { start: None }, in_win),
            staged(JobKind::Challenge { start: None }, out_win),
        ];

        let mut closed_in_win = live(
            JobKind::Bounty { start_date: None, start_time: None },
            out_win,
            JobStatus::BountyClosed,
        );
        closed_in_win.last_updated = in_win;

        let live_jobs = vec![
            live(
                JobKind::Contract { applications_open_time: None },
                in_win,
                JobStatus::Active,
            ),
            live(
                JobKind::Auction { start: None, start_time: None },
                out_win,
                JobStatus::EndingSoon,
            ),
            closed_in_win,
        ];

        let snapshot = daily_snapshot(&staged_jobs, &live_jobs, now);

        assert_eq!(snapshot.jobs_created, 2); // one staged + one live in window
        assert_eq!(snapshot.jobs_closed, 1);
        assert_eq!(snapshot.active_jobs, 2); // active + ending_soon, not the closed one
        assert_eq!(snapshot.window_start, now - Duration::hours(24));
        assert_eq!(snapshot.window_end, now);
    }

    #[test]
    fn window_is_half_open_on_the_left() {
        let now = ts("2024-05-02T00:00:00Z");
        let at_start = now - Duration::hours(24);

        let snapshot = daily_snapshot(&[staged(JobKind::Challenge { start: None }, at_start)], &[], now);
        assert_eq!(snapshot.jobs_created, 0);

        let snapshot = daily_snapshot(&[staged(JobKind::Challenge { start: None }, now)], &[], now);
        assert_eq!(snapshot.jobs_created, 1);
    }

    #[test]
    fn weekly_report_buckets_by_variant() {
        let now = ts("2024-05-08T00:00:00Z");
        let in_win = ts("2024-05-03T00:00:00Z");
        let out_win = ts("2024-04-20T00:00:00Z");

        let staged_jobs = vec![
            staged(JobKind::Bounty { start_date: None, start_time: None }, in_win),
            staged(JobKind::Bounty { start_date: None, start_time: None }, in_win),
            staged(JobKind::Auction { start: None, start_time: None }, out_win),
        ];
        let live_jobs = vec![live(
            JobKind::Contract { applications_open_time: None },
            in_win,
            JobStatus::Active,
        )];

        let report = weekly_report(&staged_jobs, &live_jobs, now);

        assert_eq!(report.jobs_created.bounty, 2);
        assert_eq!(report.jobs_created.contract, 1);
        assert_eq!(report.jobs_created.auction, 0);
        assert_eq!(report.jobs_created.total(), 3);
    }
}
