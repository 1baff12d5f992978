//! Rolling upstream-request counters for the metrics endpoint.
//!
//! Each counter keeps raw timestamps pruned to a one-day horizon; snapshots
//! report last-minute / last-hour / last-day counts.

use crate::util::Clock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ONE_MINUTE: Duration = Duration::from_secs(60);
const ONE_HOUR: Duration = Duration::from_secs(60 * 60);
const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    PseRequests,
    YtHydrateRequests,
    YtHydrateQuotaExceeded,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CounterWindows {
    pub last_minute: usize,
    pub last_hour: usize,
    pub last_day: usize,
}

#[derive(Debug, Serialize)]
pub struct CountersSnapshot {
    pub pse_requests: CounterWindows,
    pub yt_hydrate_requests: CounterWindows,
    pub yt_hydrate_quota_exceeded: CounterWindows,
}

pub struct RollingCounters {
    pse_requests: Mutex<VecDeque<std::time::Instant>>,
    yt_hydrate_requests: Mutex<VecDeque<std::time::Instant>>,
    yt_hydrate_quota_exceeded: Mutex<VecDeque<std::time::Instant>>,
    clock: Arc<dyn Clock>,
}

impl RollingCounters {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            pse_requests: Mutex::new(VecDeque::new()),
            yt_hydrate_requests: Mutex::new(VecDeque::new()),
            yt_hydrate_quota_exceeded: Mutex::new(VecDeque::new()),
            clock,
        }
    }

    pub fn record(&self, counter: Counter) {
        let now = self.clock.now();
        let mut bucket = self.bucket(counter).lock().unwrap_or_else(|e| e.into_inner());
        bucket.push_back(now);
        // Trim entries older than a day to keep memory bounded.
        while let Some(front) = bucket.front() {
            if now.duration_since(*front) >= ONE_DAY {
                bucket.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            pse_requests: self.windows(Counter::PseRequests),
            yt_hydrate_requests: self.windows(Counter::YtHydrateRequests),
            yt_hydrate_quota_exceeded: self.windows(Counter::YtHydrateQuotaExceeded),
        }
    }

    fn windows(&self, counter: Counter) -> CounterWindows {
        let now = self.clock.now();
        let bucket = self.bucket(counter).lock().unwrap_or_else(|e| e.into_inner());
        let mut windows = CounterWindows::default();
        for ts in bucket.iter() {
            let age = now.duration_since(*ts);
            if age >= ONE_DAY {
                continue;
            }
            windows.last_day += 1;
            if age < ONE_HOUR {
                windows.last_hour += 1;
            }
            if age < ONE_MINUTE {
                windows.last_minute += 1;
            }
        }
        windows
    }

    fn bucket(&self, counter: Counter) -> &Mutex<VecDeque<std::time::Instant>> {
        match counter {
            Counter::PseRequests => &self.pse_requests,
            Counter::YtHydrateRequests => &self.yt_hydrate_requests,
            Counter::YtHydrateQuotaExceeded => &self.yt_hydrate_quota_exceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_clock::ManualClock;

    #[test]
    fn windows_count_by_age() {
        let clock = Arc::new(ManualClock::new());
        let counters = RollingCounters::new(clock.clone());

        counters.record(Counter::PseRequests);
        clock.advance(Duration::from_secs(2 * 60 * 60));
        counters.record(Counter::PseRequests);
        clock.advance(Duration::from_secs(70));
        counters.record(Counter::PseRequests);

        let snap = counters.snapshot();
        assert_eq!(snap.pse_requests.last_minute, 1);
        assert_eq!(snap.pse_requests.last_hour, 2);
        assert_eq!(snap.pse_requests.last_day, 3);
        assert_eq!(snap.yt_hydrate_requests.last_day, 0);
    }

    #[test]
    fn day_old_entries_are_pruned() {
        let clock = Arc::new(ManualClock::new());
        let counters = RollingCounters::new(clock.clone());

        counters.record(Counter::YtHydrateRequests);
        clock.advance(Duration::from_secs(25 * 60 * 60));
        counters.record(Counter::YtHydrateRequests);

        let snap = counters.snapshot();
        assert_eq!(snap.yt_hydrate_requests.last_day, 1);
    }
}
