/// Fixed-interval polling schedule.
///
/// Status is polled every few seconds; logs only while the logs view is
/// active. Intervals never adapt: a failed fetch does not delay or cancel
/// the next tick.
use std::time::{Duration, Instant};

use crate::config::schema::PollingConfig;

/// Work the poll loop should do now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Status,
    Logs,
}

/// One fixed-interval timer. A fresh ticker is due immediately.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    last: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Fire if due, recording `now` as the last tick.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    /// Make the ticker due on the next poll.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Debug, Clone)]
pub struct Schedule {
    status: Ticker,
    logs: Ticker,
    logs_active: bool,
}

impl Schedule {
    pub fn new(status_every: Duration, logs_every: Duration) -> Self {
        Self {
            status: Ticker::new(status_every),
            logs: Ticker::new(logs_every),
            logs_active: false,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(
            Duration::from_secs(config.status_interval_secs.max(1)),
            Duration::from_secs(config.logs_interval_secs.max(1)),
        )
    }

    /// Switch the logs view on or off. Activating it fetches right away.
    pub fn set_logs_active(&mut self, active: bool) {
        if active && !self.logs_active {
            self.logs.reset();
        }
        self.logs_active = active;
    }

    pub fn logs_active(&self) -> bool {
        self.logs_active
    }

    /// Jobs due at `now`, status first.
    pub fn due(&mut self, now: Instant) -> Vec<Job> {
        let mut jobs = Vec::new();
        if self.status.poll(now) {
            jobs.push(Job::Status);
        }
        if self.logs_active && self.logs.poll(now) {
            jobs.push(Job::Logs);
        }
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_fires_on_interval() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(Duration::from_secs(5));
        assert!(ticker.poll(t0));
        assert!(!ticker.poll(t0 + Duration::from_secs(4)));
        assert!(ticker.poll(t0 + Duration::from_secs(5)));
        assert!(!ticker.poll(t0 + Duration::from_secs(6)));
    }

    #[test]
    fn logs_only_run_while_active() {
        let t0 = Instant::now();
        let mut schedule = Schedule::new(Duration::from_secs(5), Duration::from_secs(15));
        assert_eq!(schedule.due(t0), vec![Job::Status]);

        schedule.set_logs_active(true);
        assert_eq!(schedule.due(t0 + Duration::from_secs(1)), vec![Job::Logs]);
        assert!(schedule.due(t0 + Duration::from_secs(2)).is_empty());
        assert_eq!(
            schedule.due(t0 + Duration::from_secs(16)),
            vec![Job::Status, Job::Logs]
        );

        schedule.set_logs_active(false);
        assert_eq!(schedule.due(t0 + Duration::from_secs(40)), vec![Job::Status]);
    }

    #[test]
    fn reactivating_logs_fetches_immediately() {
        let t0 = Instant::now();
        let mut schedule = Schedule::new(Duration::from_secs(5), Duration::from_secs(15));
        schedule.set_logs_active(true);
        schedule.due(t0);
        schedule.set_logs_active(false);
        schedule.set_logs_active(true);
        assert!(schedule.due(t0 + Duration::from_secs(1)).contains(&Job::Logs));
    }

    #[test]
    fn from_config_uses_intervals() {
        let t0 = Instant::now();
        let mut schedule = Schedule::from_config(&PollingConfig::default());
        schedule.due(t0);
        assert!(schedule.due(t0 + Duration::from_secs(4)).is_empty());
        assert_eq!(schedule.due(t0 + Duration::from_secs(5)), vec![Job::Status]);
    }
}
