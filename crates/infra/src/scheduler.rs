//! Interval scheduling for the runner's task sets.
//!
//! Each cadence gets its own worker thread with a graceful-shutdown channel.
//! There is no cross-worker mutual exclusion and no single-flight guarantee:
//! if a tick overruns its interval, the next fires as soon as the current one
//! returns, and two cadences may touch the same collections concurrently.
//! Accepted looseness for best-effort periodic maintenance; a lease document
//! keyed by task name is the known mitigation if cadences ever tighten.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use gigboard_core::RunId;

use crate::document_store::DocumentStore;
use crate::runner::TaskRunner;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Cadences for the three task sets.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Lifecycle tick interval.
    pub lifecycle_interval: Duration,
    /// Daily aggregation interval.
    pub daily_interval: Duration,
    /// Weekly maintenance interval.
    pub weekly_interval: Duration,
    /// UTC hour at which the daily and weekly workers first fire.
    pub fixed_hour_utc: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lifecycle_interval: Duration::from_secs(60),
            daily_interval: Duration::from_secs(24 * 60 * 60),
            weekly_interval: Duration::from_secs(7 * 24 * 60 * 60),
            fixed_hour_utc: 2,
        }
    }
}

/// The running worker set.
#[derive(Debug)]
pub struct SchedulerHandles {
    pub lifecycle: WorkerHandle,
    pub daily: WorkerHandle,
    pub weekly: WorkerHandle,
}

impl SchedulerHandles {
    pub fn shutdown(self) {
        self.lifecycle.shutdown();
        self.daily.shutdown();
        self.weekly.shutdown();
    }
}

/// Spawn the lifecycle, daily, and weekly workers against one runner.
pub fn start<S>(runner: std::sync::Arc<TaskRunner<S>>, config: SchedulerConfig) -> SchedulerHandles
where
    S: DocumentStore + Clone + Send + Sync + 'static,
{
    let first_fixed = delay_until_hour_utc(Utc::now(), config.fixed_hour_utc);

    let lifecycle = {
        let runner = runner.clone();
        spawn_interval_worker(
            "lifecycle-tick",
            config.lifecycle_interval,
            config.lifecycle_interval,
            move || report_failures("lifecycle-tick", runner.run_lifecycle_tick(RunId::new())),
        )
    };

    let daily = {
        let runner = runner.clone();
        spawn_interval_worker("daily-analytics", first_fixed, config.daily_interval, move || {
            report_failures("daily-analytics", runner.run_daily(RunId::new()))
        })
    };

    let weekly = spawn_interval_worker(
        "weekly-maintenance",
        first_fixed,
        config.weekly_interval,
        move || report_failures("weekly-maintenance", runner.run_weekly(RunId::new())),
    );

    SchedulerHandles { lifecycle, daily, weekly }
}

fn report_failures(worker: &'static str, report: crate::task::RunReport) {
    if !report.all_succeeded() {
        warn!(
            worker,
            run = %report.run_id,
            failed = report.failed_count(),
            "run completed with failures"
        );
    }
}

/// Spawn a worker that invokes `tick` every `every`, first after
/// `first_delay`, until shut down.
pub fn spawn_interval_worker<F>(
    name: &'static str,
    first_delay: Duration,
    every: Duration,
    tick: F,
) -> WorkerHandle
where
    F: FnMut() + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let join = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || worker_loop(name, first_delay, every, shutdown_rx, tick))
        .expect("failed to spawn scheduler worker thread");

    WorkerHandle {
        shutdown: shutdown_tx,
        join: Some(join),
    }
}

fn worker_loop<F>(
    name: &'static str,
    first_delay: Duration,
    every: Duration,
    shutdown_rx: mpsc::Receiver<()>,
    mut tick: F,
) where
    F: FnMut(),
{
    info!(worker = name, "scheduler worker started");

    let mut next_tick = Instant::now() + first_delay;
    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match shutdown_rx.recv_timeout(wait) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        tick();

        // An overrunning tick skips its missed slots instead of bursting.
        next_tick += every;
        let now = Instant::now();
        while next_tick <= now {
            next_tick += every;
        }
    }

    info!(worker = name, "scheduler worker stopped");
}

/// Delay from `now` until the next occurrence of `hour:00` UTC.
pub fn delay_until_hour_utc(now: DateTime<Utc>, hour: u32) -> Duration {
    let hour = hour % 24;
    let today_at = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);

    let target = if today_at > now {
        today_at
    } else {
        today_at + chrono::Duration::days(1)
    };

    (target - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn worker_ticks_repeatedly_until_shutdown() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ticks = counter.clone();

        let handle = spawn_interval_worker(
            "test-worker",
            Duration::from_millis(5),
            Duration::from_millis(20),
            move || {
                ticks.fetch_add(1, Ordering::SeqCst);
            },
        );

        thread::sleep(Duration::from_millis(120));
        handle.shutdown();

        let observed = counter.load(Ordering::SeqCst);
        assert!(observed >= 2, "expected at least 2 ticks, saw {observed}");

        // No further ticks after shutdown.
        thread::sleep(Duration::from_millis(60));
        assert_eq!(counter.load(Ordering::SeqCst), observed);
    }

    #[test]
    fn delay_until_hour_rolls_to_tomorrow_when_past() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 3, 30, 0).unwrap();

        let before = delay_until_hour_utc(now, 4);
        assert_eq!(before, Duration::from_secs(30 * 60));

        let after = delay_until_hour_utc(now, 2);
        assert_eq!(after, Duration::from_secs(22 * 60 * 60 + 30 * 60));
    }

    #[test]
    fn timelike_hour_is_wrapped() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 3, 30, 0).unwrap();
        assert_eq!(delay_until_hour_utc(now, 28), delay_until_hour_utc(now, 4));
        // Sanity: `now` itself has the expected hour.
        assert_eq!(now.hour(), 3);
    }
}
