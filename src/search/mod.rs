//! Result aggregation: candidate model, scoring, and the ranking engine.

pub mod engine;
pub mod scoring;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use engine::{SearchEngine, SearchOptions, SearchOutcome, SearchProvider, StatsProvider};
pub use scoring::ScoringWeights;

/// A candidate video flowing through one aggregation pass.
///
/// `video_id` uniquely identifies a candidate within a pass; the first
/// occurrence wins on merge. `duration_seconds` and `view_count` stay zero
/// until stats enrichment fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    pub youtube_url: String,
    /// ISO-8601 timestamp, or empty when the upstream had none.
    pub published_at: String,
    pub duration_seconds: u64,
    pub view_count: u64,
}

impl VideoCandidate {
    /// Canonical watch URL for a video id.
    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={video_id}")
    }
}

/// Authoritative per-video statistics from the stats provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub video_id: String,
    pub duration_seconds: u64,
    pub view_count: u64,
}

/// Pipeline limits and cache sizing for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upstream results requested per fanned-out query.
    pub per_query_results: usize,
    /// Working-set bound across all queries, limiting enrichment cost.
    pub candidate_ceiling: usize,
    /// Stats provider batch bound.
    pub stats_batch: usize,
    /// Final response truncation.
    pub results_limit: usize,
    /// When false, skip enrichment and always report degraded.
    pub hydrate_enabled: bool,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub weights: ScoringWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            per_query_results: 15,
            candidate_ceiling: 60,
            stats_batch: 50,
            results_limit: 8,
            hydrate_enabled: true,
            cache_ttl: Duration::from_secs(120),
            cache_capacity: 5000,
            weights: ScoringWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            per_query_results: config.per_query_results,
            candidate_ceiling: config.candidate_ceiling,
            stats_batch: 50,
            results_limit: config.results_limit,
            hydrate_enabled: config.enable_yt_hydrate,
            cache_ttl: Duration::from_secs(config.search_cache_ttl_secs),
            cache_capacity: config.search_cache_capacity,
            weights: ScoringWeights {
                recency_weight: config.recency_weight,
                channel_penalty: config.channel_penalty,
                recency_half_life_days: config.recency_half_life_days,
                duration_bonus_threshold_secs: config.duration_bonus_threshold_secs,
                duration_bonus: config.duration_bonus,
            },
        }
    }
}
