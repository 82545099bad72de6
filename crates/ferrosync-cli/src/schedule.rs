//! Daily trigger for unattended backups

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone};
use ferrosync_types::DailyTime;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// First occurrence of `at` strictly after `now`
///
/// A wall-clock time skipped by a daylight saving jump resolves to one hour later; a
/// repeated one resolves to its first occurrence.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, at: DailyTime) -> DateTime<Tz> {
    let timezone = now.timezone();
    let mut date = now.date_naive();

    loop {
        if let Some(candidate) = resolve_local(&timezone, date.and_time(at.to_naive_time())) {
            if candidate > *now {
                return candidate;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => return now.clone(),
        }
    }
}

fn resolve_local<Tz: TimeZone>(timezone: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    timezone.from_local_datetime(&local).earliest().or_else(|| {
        timezone
            .from_local_datetime(&(local + TimeDelta::hours(1)))
            .earliest()
    })
}

/// How long to sleep before looking at the clock again, `None` once `deadline` passed
pub fn sleep_slice<Tz: TimeZone>(
    now: &DateTime<Tz>,
    deadline: &DateTime<Tz>,
    poll_interval: Duration,
) -> Option<Duration> {
    let remaining = deadline.clone().signed_duration_since(now.clone()).to_std().ok()?;
    if remaining.is_zero() {
        None
    } else {
        Some(remaining.min(poll_interval))
    }
}

/// Runs a job once a day at a fixed local time
///
/// The job runs on the calling thread, so two runs can never overlap. Sleeping in slices
/// keeps the trigger accurate across suspend and clock changes.
#[derive(Debug, Clone, Copy)]
pub struct DailyScheduler {
    at: DailyTime,
    poll_interval: Duration,
}

impl DailyScheduler {
    /// Create a scheduler firing at `at`, checking the clock at least every `poll_interval`
    pub fn new(at: DailyTime, poll_interval: Duration) -> Self {
        Self { at, poll_interval }
    }

    /// Time of day the job runs
    pub fn at(&self) -> DailyTime {
        self.at
    }

    /// Wait for each trigger and run `job`, forever
    pub fn run_forever(&self, mut job: impl FnMut()) -> ! {
        loop {
            let next = next_run_after(&Local::now(), self.at);
            info!("Next backup scheduled for {}", next.format("%Y-%m-%d %H:%M"));
            self.sleep_until(&next);
            job();
        }
    }

    fn sleep_until(&self, deadline: &DateTime<Local>) {
        while let Some(slice) = sleep_slice(&Local::now(), deadline, self.poll_interval) {
            debug!("Sleeping {:?} until {}", slice, deadline.format("%H:%M"));
            thread::sleep(slice);
        }
    }
}
