//! Session-scoped queue persistence.
//!
//! Advisory, process-local storage: queue state keyed by session and date,
//! plus the per-session 32-bit shuffle salt minted on first contact. Losing
//! this state only costs resumability, never correctness.

use crate::rotation::QueueState;
use crate::util::Clock;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct StoredQueue {
    state: QueueState,
    touched_at: Instant,
}

pub struct SessionQueueStore {
    salts: DashMap<String, u32>,
    states: DashMap<String, StoredQueue>,
    clock: Arc<dyn Clock>,
}

impl SessionQueueStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            salts: DashMap::new(),
            states: DashMap::new(),
            clock,
        }
    }

    /// The session's shuffle salt, generated once and reused for every
    /// date-keyed shuffle in that session.
    pub fn salt(&self, session: &str) -> u32 {
        *self
            .salts
            .entry(session.to_owned())
            .or_insert_with(rand::random::<u32>)
    }

    pub fn load(&self, session: &str, date_key: &str) -> Option<QueueState> {
        self.states
            .get(&storage_key(session, date_key))
            .map(|entry| entry.state.clone())
    }

    pub fn save(&self, session: &str, date_key: &str, state: QueueState) {
        self.states.insert(
            storage_key(session, date_key),
            StoredQueue {
                state,
                touched_at: self.clock.now(),
            },
        );
    }

    pub fn clear(&self, session: &str, date_key: &str) {
        self.states.remove(&storage_key(session, date_key));
    }

    /// Drop queue state untouched for longer than `max_idle`. Salts are a
    /// few bytes each and follow their last queue out.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = self.clock.now();
        let before = self.states.len();
        self.states
            .retain(|_, stored| now.duration_since(stored.touched_at) < max_idle);
        if self.states.is_empty() {
            self.salts.clear();
        }
        before - self.states.len()
    }
}

/// Mirrors the session-storage key shape: `{session}:queue:{date}`.
fn storage_key(session: &str, date_key: &str) -> String {
    format!("{session}:queue:{date_key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::initialize;
    use crate::util::test_clock::ManualClock;

    fn store() -> (SessionQueueStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (SessionQueueStore::new(clock.clone()), clock)
    }

    #[test]
    fn salt_is_stable_per_session() {
        let (store, _clock) = store();
        let a = store.salt("sess-1");
        assert_eq!(store.salt("sess-1"), a);
    }

    #[test]
    fn save_load_round_trips_per_date() {
        let (store, _clock) = store();
        let salt = store.salt("sess-1");
        let state = initialize(5, "2026-08-30", salt, None).expect("state");

        store.save("sess-1", "2026-08-30", state.clone());
        assert_eq!(store.load("sess-1", "2026-08-30"), Some(state));
        assert_eq!(store.load("sess-1", "2026-08-31"), None);
        assert_eq!(store.load("sess-2", "2026-08-30"), None);

        store.clear("sess-1", "2026-08-30");
        assert_eq!(store.load("sess-1", "2026-08-30"), None);
    }

    #[test]
    fn sweep_drops_idle_state() {
        let (store, clock) = store();
        let state = initialize(3, "2026-08-30", 1, None).expect("state");
        store.save("sess-1", "2026-08-30", state.clone());

        clock.advance(Duration::from_secs(60 * 60));
        store.save("sess-2", "2026-08-30", state);

        clock.advance(Duration::from_secs(12 * 60 * 60));
        let removed = store.sweep_idle(Duration::from_secs(13 * 60 * 60) - Duration::from_secs(1));
        assert_eq!(removed, 1);
        assert!(store.load("sess-1", "2026-08-30").is_none());
        assert!(store.load("sess-2", "2026-08-30").is_some());
    }
}
