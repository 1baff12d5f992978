//! Sliding-window per-IP request limiting.
//!
//! One bucket of request timestamps per client IP. A check prunes entries
//! older than the window, rejects without recording when the budget is
//! spent, and records the attempt otherwise. The limit is advisory quota
//! protection, not strict fairness: state is per-process and best-effort.
//!
//! Buckets are never destroyed by the request path, so a background sweep
//! removes buckets with no activity inside the window.

use crate::util::Clock;
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check, including header material.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub limited: bool,
    pub limit: u32,
    pub remaining: u32,
    pub window: Duration,
}

pub struct RateLimiter {
    buckets: DashMap<IpAddr, Vec<Instant>>,
    window: Duration,
    max: u32,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            window,
            max,
            clock,
        }
    }

    /// Check and (when allowed) record a request from `ip`.
    ///
    /// Rejected attempts are not recorded, so a client hammering the
    /// endpoint does not push its own window forward.
    pub fn check(&self, ip: IpAddr) -> RateDecision {
        let now = self.clock.now();
        let mut bucket = self.buckets.entry(ip).or_default();
        bucket.retain(|ts| now.duration_since(*ts) < self.window);

        let count = bucket.len() as u32;
        if count >= self.max {
            return RateDecision {
                limited: true,
                limit: self.max,
                remaining: 0,
                window: self.window,
            };
        }

        bucket.push(now);
        RateDecision {
            limited: false,
            limit: self.max,
            remaining: self.max - count - 1,
            window: self.window,
        }
    }

    /// Drop buckets with no request inside the window. Called periodically
    /// from a background task so long uptimes don't accumulate dead keys.
    pub fn sweep_idle(&self) -> usize {
        let now = self.clock.now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| bucket.iter().any(|ts| now.duration_since(*ts) < self.window));
        before - self.buckets.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_clock::ManualClock;

    fn limiter(max: u32) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::new(Duration::from_millis(60_000), max, clock.clone());
        (limiter, clock)
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn rejects_request_over_budget_within_window() {
        let (limiter, _clock) = limiter(10);
        for i in 0..10 {
            let decision = limiter.check(ip(1));
            assert!(!decision.limited, "request {i} should pass");
        }
        let decision = limiter.check(ip(1));
        assert!(decision.limited);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn accepts_again_after_window_elapses() {
        let (limiter, clock) = limiter(10);
        for _ in 0..10 {
            limiter.check(ip(1));
        }
        assert!(limiter.check(ip(1)).limited);

        clock.advance(Duration::from_millis(60_000));
        let decision = limiter.check(ip(1));
        assert!(!decision.limited);
        assert_eq!(decision.remaining, 9);
    }

    #[test]
    fn clients_do_not_share_buckets() {
        let (limiter, _clock) = limiter(2);
        limiter.check(ip(1));
        limiter.check(ip(1));
        assert!(limiter.check(ip(1)).limited);
        assert!(!limiter.check(ip(2)).limited);
    }

    #[test]
    fn rejected_attempts_are_not_recorded() {
        let (limiter, clock) = limiter(2);
        limiter.check(ip(1));
        clock.advance(Duration::from_millis(30_000));
        limiter.check(ip(1));
        assert!(limiter.check(ip(1)).limited);

        // First timestamp falls out of the window; the rejected attempt
        // above must not have consumed a slot.
        clock.advance(Duration::from_millis(30_001));
        assert!(!limiter.check(ip(1)).limited);
    }

    #[test]
    fn sweep_removes_idle_buckets() {
        let (limiter, clock) = limiter(10);
        limiter.check(ip(1));
        limiter.check(ip(2));
        clock.advance(Duration::from_millis(59_000));
        limiter.check(ip(2));
        clock.advance(Duration::from_millis(2_000));

        let removed = limiter.sweep_idle();
        assert_eq!(removed, 1);
        // The surviving bucket still counts its in-window request.
        assert_eq!(limiter.check(ip(2)).remaining, 8);
    }
}
