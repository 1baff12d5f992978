//! Candidate scoring: view-count, recency, duration, and seeded jitter.
//!
//! The base score mixes a logarithmic view term (so raw counts spanning
//! orders of magnitude don't dominate linearly), exponential recency decay,
//! and a flat bonus for longer-form uploads. A greedy per-channel penalty is
//! applied by the engine on top of the base score.

use crate::search::VideoCandidate;
use chrono::{DateTime, Utc};

/// Age assigned to candidates whose `published_at` cannot be parsed:
/// maximally old, so they earn zero recency credit without erroring.
const UNPARSEABLE_AGE_DAYS: f64 = 3650.0;

/// Named scoring weights. Defaults match the canonical deployment; every
/// value is overridable through configuration.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub recency_weight: f64,
    pub channel_penalty: f64,
    pub recency_half_life_days: f64,
    pub duration_bonus_threshold_secs: u64,
    pub duration_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            recency_weight: 0.5,
            channel_penalty: 0.2,
            recency_half_life_days: 60.0,
            duration_bonus_threshold_secs: 600,
            duration_bonus: 0.25,
        }
    }
}

/// Age of a candidate in days at `now`, or the unparseable sentinel.
pub fn age_days(candidate: &VideoCandidate, now: DateTime<Utc>) -> f64 {
    match DateTime::parse_from_rfc3339(&candidate.published_at) {
        Ok(published) => {
            let age = now.signed_duration_since(published.with_timezone(&Utc));
            (age.num_milliseconds() as f64 / 86_400_000.0).max(0.0)
        }
        Err(_) => UNPARSEABLE_AGE_DAYS,
    }
}

/// Base score before diversity penalty and jitter.
pub fn base_score(candidate: &VideoCandidate, now: DateTime<Utc>, weights: &ScoringWeights) -> f64 {
    let views = ((candidate.view_count + 1) as f64).log10();
    let recency =
        (-age_days(candidate, now) / weights.recency_half_life_days).exp() * weights.recency_weight;
    let duration_bonus = if candidate.duration_seconds >= weights.duration_bonus_threshold_secs {
        weights.duration_bonus
    } else {
        0.0
    };
    views + recency + duration_bonus
}

/// Deterministic tie-breaking jitter in `[-0.1, 0.1)`.
///
/// A multiply-31 string hash seeded with the respin seed, reduced to a
/// bounded range. Reproducible for a given (seed, id) pair, but effectively
/// unpredictable without the seed.
pub fn jitter(video_id: &str, seed: i64) -> f64 {
    let mut h = seed as i32;
    for byte in video_id.bytes() {
        h = h.wrapping_mul(31).wrapping_add(byte as i32);
    }
    ((h as u32) % 2000) as f64 / 10_000.0 - 0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(published_at: &str, duration: u64, views: u64) -> VideoCandidate {
        VideoCandidate {
            video_id: "abc123".into(),
            title: "t".into(),
            channel_title: "c".into(),
            thumbnail_url: String::new(),
            youtube_url: VideoCandidate::watch_url("abc123"),
            published_at: published_at.into(),
            duration_seconds: duration,
            view_count: views,
        }
    }

    #[test]
    fn jitter_is_deterministic_and_bounded() {
        for seed in [0i64, 1, 42, -7, i64::from(i32::MAX)] {
            for id in ["dQw4w9WgXcQ", "abc", "", "Z_y-12"] {
                let a = jitter(id, seed);
                let b = jitter(id, seed);
                assert_eq!(a, b, "jitter must be stable for ({id}, {seed})");
                assert!((-0.1..0.1).contains(&a), "jitter {a} out of bounds");
            }
        }
    }

    #[test]
    fn jitter_varies_with_seed() {
        let values: Vec<f64> = (0..16).map(|seed| jitter("dQw4w9WgXcQ", seed)).collect();
        let first = values[0];
        assert!(values.iter().any(|v| *v != first));
    }

    #[test]
    fn fresher_uploads_score_higher() {
        let now = Utc::now();
        let weights = ScoringWeights::default();
        let fresh = candidate(&now.to_rfc3339(), 0, 1000);
        let old = candidate("2015-01-01T00:00:00Z", 0, 1000);
        assert!(base_score(&fresh, now, &weights) > base_score(&old, now, &weights));
    }

    #[test]
    fn unparseable_timestamp_gets_no_recency_credit() {
        let now = Utc::now();
        let weights = ScoringWeights::default();
        let garbled = candidate("not-a-date", 0, 1000);
        let ancient = candidate("2016-06-01T00:00:00Z", 0, 1000);
        let diff = (base_score(&garbled, now, &weights) - base_score(&ancient, now, &weights)).abs();
        assert!(diff < 1e-3, "garbled dates should score like very old uploads");
    }

    #[test]
    fn long_form_bonus_applies_at_threshold() {
        let now = Utc::now();
        let weights = ScoringWeights::default();
        let short = candidate("", 599, 100);
        let long = candidate("", 600, 100);
        let gap = base_score(&long, now, &weights) - base_score(&short, now, &weights);
        assert!((gap - weights.duration_bonus).abs() < 1e-9);
    }

    #[test]
    fn views_enter_logarithmically() {
        let now = Utc::now();
        let weights = ScoringWeights::default();
        let small = candidate("", 0, 999);
        let large = candidate("", 0, 999_999);
        let gap = base_score(&large, now, &weights) - base_score(&small, now, &weights);
        assert!((gap - 3.0).abs() < 0.01, "1000x views is ~3 log points, got {gap}");
    }
}
