//! Fixed-cadence driver.
//!
//! The first cycle runs immediately; each later cycle is due `interval` after
//! the previous one finished. Between checks the scheduler sleeps for `poll`.
//! Cycles never overlap: everything runs on the caller's thread.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::config::ScheduleSettings;
use crate::domain::orchestrator::{CycleReport, Orchestrator};
use crate::ports::clock_port::Clock;

#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: TimeDelta,
    poll: Duration,
    next_run: Option<DateTime<Utc>>,
}

impl Scheduler {
    pub fn new(interval: TimeDelta, poll: Duration) -> Self {
        Self {
            interval,
            poll,
            next_run: None,
        }
    }

    pub fn from_settings(settings: &ScheduleSettings) -> Self {
        Self::new(settings.interval, settings.poll)
    }

    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.next_run
    }

    /// Evaluate if a cycle is due; returns its report when one ran.
    pub fn poll_once(&mut self, orchestrator: &mut Orchestrator<'_>, clock: &dyn Clock) -> Option<CycleReport> {
        let now = clock.now();
        if self.next_run.is_some_and(|due| now < due) {
            return None;
        }

        let report = orchestrator.evaluate();
        let finished = clock.now();
        let next = finished
            .checked_add_signed(self.interval)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.next_run = Some(next);
        info!(outcome = report.outcome.label(), next = %next, "cycle complete");
        Some(report)
    }

    /// Poll `wakeups` times, sleeping between polls; collects every report.
    pub fn run_for(
        &mut self,
        orchestrator: &mut Orchestrator<'_>,
        clock: &dyn Clock,
        wakeups: usize,
    ) -> Vec<CycleReport> {
        let mut reports = Vec::new();
        for _ in 0..wakeups {
            if let Some(report) = self.poll_once(orchestrator, clock) {
                reports.push(report);
            }
            clock.sleep(self.poll);
        }
        reports
    }

    /// Drive the orchestrator until the process is terminated.
    pub fn run_forever(&mut self, orchestrator: &mut Orchestrator<'_>, clock: &dyn Clock) -> ! {
        info!(
            interval_secs = self.interval.num_seconds(),
            poll_secs = self.poll.as_secs(),
            symbol = orchestrator.symbol(),
            "scheduler started"
        );
        loop {
            if self.poll_once(orchestrator, clock).is_none() {
                debug!("no cycle due");
            }
            clock.sleep(self.poll);
        }
    }
}
