//! Deterministic session rotation: seeded shuffle plus queue state machine.
//!
//! A day's item list is shuffled once per (date, session) into `order`, and
//! navigation walks that permutation without repeating an item until every
//! item has been shown. Transitions are pure: they take a state and return
//! the next one, so callers serialize concurrent navigation however they
//! like and persistence stays a separate concern.

pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// FNV-1a hash of a date key, the stable half of the shuffle seed.
pub fn seed_from_date(date: &str) -> u32 {
    if date.is_empty() {
        return 0;
    }
    let mut hash: u32 = 0x811c9dc5;
    for byte in date.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// mulberry32: a tiny deterministic PRNG. Reproducibility is the goal here,
/// not unpredictability.
struct Mulberry32 {
    t: u32,
}

impl Mulberry32 {
    fn new(seed: u32) -> Self {
        Self { t: seed }
    }

    /// Next value in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        self.t = self.t.wrapping_add(0x6d2b_79f5);
        let t = self.t;
        let mut r = (t ^ (t >> 15)).wrapping_mul(1 | t);
        r ^= r.wrapping_add((r ^ (r >> 7)).wrapping_mul(61 | r));
        f64::from(r ^ (r >> 14)) / 4_294_967_296.0
    }
}

/// Fisher–Yates permutation of `[0, len)` driven by a seeded PRNG.
pub fn seeded_shuffle(len: usize, seed: u32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    if len <= 1 {
        return order;
    }
    let mut rng = Mulberry32::new(seed);
    for i in (1..len).rev() {
        let j = (rng.next_f64() * (i + 1) as f64) as usize;
        order.swap(i, j);
    }
    order
}

/// Queue position within one day's rotation.
///
/// Invariants: `order` is a permutation of `[0, len)`, `current` indexes
/// into `order`, and `seen` holds only valid pointer values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    pub order: Vec<usize>,
    pub current: usize,
    pub seen: BTreeSet<usize>,
}

impl QueueState {
    /// Fresh state: shuffle `[0, len)` with `fnv1a(date) XOR salt`, start at
    /// the head with nothing seen.
    pub fn new(len: usize, date_key: &str, session_salt: u32) -> Self {
        let seed = seed_from_date(date_key) ^ session_salt;
        Self {
            order: seeded_shuffle(len, seed),
            current: 0,
            seen: BTreeSet::new(),
        }
    }

    /// Reuse a stored state if its permutation still matches the item list,
    /// clamping `current` and filtering `seen` defensively. Anything else
    /// is treated as absent so the caller regenerates.
    pub fn sanitize(self, len: usize) -> Option<Self> {
        if len == 0 || self.order.len() != len {
            return None;
        }
        let mut sorted = self.order.clone();
        sorted.sort_unstable();
        if sorted.iter().enumerate().any(|(i, v)| i != *v) {
            return None;
        }
        Some(Self {
            order: self.order,
            current: self.current % len,
            seen: self.seen.into_iter().filter(|p| *p < len).collect(),
        })
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    /// Step forward to the nearest unseen pointer after `current`
    /// (wrapping). Once everything has been seen, the next step starts a
    /// fresh cycle at `(current + 1) % len` with only that pointer seen.
    pub fn advance(&self) -> Self {
        let len = self.len();
        if len == 0 {
            return self.clone();
        }

        if self.seen.len() >= len {
            let next = (self.current + 1) % len;
            return Self {
                order: self.order.clone(),
                current: next,
                seen: BTreeSet::from([next]),
            };
        }

        let mut next = self.current;
        for offset in 1..=len {
            let candidate = (self.current + offset) % len;
            if !self.seen.contains(&candidate) {
                next = candidate;
                break;
            }
        }
        let mut seen = self.seen.clone();
        seen.insert(next);
        Self {
            order: self.order.clone(),
            current: next,
            seen,
        }
    }

    /// Step backward one position unconditionally; backward navigation has
    /// no unseen constraint but still marks the pointer seen.
    pub fn retreat(&self) -> Self {
        let len = self.len();
        if len == 0 {
            return self.clone();
        }
        let next = (self.current + len - 1) % len;
        let mut seen = self.seen.clone();
        seen.insert(next);
        Self {
            order: self.order.clone(),
            current: next,
            seen,
        }
    }

    /// The visible ordering: `order` rotated so the current pointer leads.
    pub fn presented(&self) -> Vec<usize> {
        let len = self.len();
        if len == 0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&self.order[self.current..]);
        out.extend_from_slice(&self.order[..self.current]);
        out
    }

    /// Item index of the active (now-playing) entry.
    pub fn active(&self) -> Option<usize> {
        self.order.get(self.current).copied()
    }
}

/// Load-or-create for a day's queue: a valid stored state wins, otherwise a
/// fresh shuffle. Empty item lists clear to `None`.
pub fn initialize(
    len: usize,
    date_key: &str,
    session_salt: u32,
    stored: Option<QueueState>,
) -> Option<QueueState> {
    if len == 0 || date_key.is_empty() {
        return None;
    }
    if let Some(state) = stored.and_then(|s| s.sanitize(len)) {
        return Some(state);
    }
    Some(QueueState::new(len, date_key, session_salt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation(order: &[usize], len: usize) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        sorted == (0..len).collect::<Vec<_>>()
    }

    #[test]
    fn shuffle_is_a_permutation() {
        for len in [0, 1, 2, 3, 7, 25, 100] {
            for seed in [0u32, 1, 0xdead_beef, u32::MAX] {
                let order = seeded_shuffle(len, seed);
                assert!(is_permutation(&order, len), "len={len} seed={seed}");
            }
        }
    }

    #[test]
    fn shuffle_reproduces_for_same_date_and_salt() {
        let a = QueueState::new(12, "2026-08-30", 0x1234_5678);
        let b = QueueState::new(12, "2026-08-30", 0x1234_5678);
        assert_eq!(a.order, b.order);
    }

    #[test]
    fn shuffle_varies_across_dates_and_salts() {
        let base = QueueState::new(25, "2026-08-30", 7);
        let other_date = QueueState::new(25, "2026-08-31", 7);
        let other_salt = QueueState::new(25, "2026-08-30", 8);
        assert_ne!(base.order, other_date.order);
        assert_ne!(base.order, other_salt.order);
    }

    #[test]
    fn advance_visits_all_pointers_before_repeating() {
        let mut state = QueueState::new(7, "2026-01-02", 99);
        let mut visited = BTreeSet::new();
        for _ in 0..7 {
            state = state.advance();
            assert!(visited.insert(state.current), "pointer repeated early");
        }
        assert_eq!(state.seen.len(), 7);
    }

    #[test]
    fn wraparound_starts_fresh_cycle() {
        let mut state = QueueState::new(3, "2026-01-02", 0);
        for _ in 0..3 {
            state = state.advance();
        }
        assert_eq!(state.seen.len(), 3);

        let next = state.advance();
        assert_eq!(next.current, (state.current + 1) % 3);
        assert_eq!(next.seen, BTreeSet::from([next.current]));
    }

    #[test]
    fn retreat_wraps_and_marks_seen() {
        let state = QueueState::new(4, "2026-01-02", 0);
        assert_eq!(state.current, 0);
        let back = state.retreat();
        assert_eq!(back.current, 3);
        assert!(back.seen.contains(&3));
    }

    #[test]
    fn presented_rotates_current_to_front() {
        let state = QueueState {
            order: vec![2, 0, 3, 1],
            current: 2,
            seen: BTreeSet::new(),
        };
        assert_eq!(state.presented(), vec![3, 1, 2, 0]);
        assert_eq!(state.active(), Some(3));
    }

    #[test]
    fn sanitize_rejects_broken_permutations() {
        let state = QueueState {
            order: vec![0, 0, 2],
            current: 0,
            seen: BTreeSet::new(),
        };
        assert!(state.sanitize(3).is_none());

        let wrong_len = QueueState {
            order: vec![0, 1, 2],
            current: 0,
            seen: BTreeSet::new(),
        };
        assert!(wrong_len.sanitize(4).is_none());
    }

    #[test]
    fn sanitize_clamps_current_and_filters_seen() {
        let state = QueueState {
            order: vec![1, 0, 2],
            current: 7,
            seen: BTreeSet::from([0, 2, 9]),
        };
        let clean = state.sanitize(3).expect("valid permutation");
        assert_eq!(clean.current, 1);
        assert_eq!(clean.seen, BTreeSet::from([0, 2]));
    }

    #[test]
    fn initialize_prefers_valid_stored_state() {
        let stored = QueueState {
            order: vec![2, 1, 0],
            current: 1,
            seen: BTreeSet::from([1]),
        };
        let loaded = initialize(3, "2026-08-30", 42, Some(stored.clone()));
        assert_eq!(loaded, Some(stored));

        let regenerated = initialize(4, "2026-08-30", 42, None).expect("state");
        assert!(is_permutation(&regenerated.order, 4));
        assert_eq!(regenerated.current, 0);
        assert!(regenerated.seen.is_empty());
    }

    #[test]
    fn initialize_clears_on_empty_input() {
        assert!(initialize(0, "2026-08-30", 1, None).is_none());
        assert!(initialize(5, "", 1, None).is_none());
    }
}
