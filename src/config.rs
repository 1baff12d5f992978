//! Environment-backed configuration.
//!
//! Every tunable lives here: upstream credentials, scoring weights, cache
//! TTLs, and rate-limit windows. All values have defaults so the server
//! starts (in degraded mode) without any environment at all.

use serde::Deserialize;
use std::time::Duration;

/// Queries used for the initial feed when `BLOOM_DEFAULT_FEED` is unset.
const FALLBACK_FEED_QUERIES: &[&str] = &[
    "latest world news",
    "technology updates",
    "science breakthroughs",
    "finance market news",
    "health discoveries",
    "entertainment highlights",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    // Upstream credentials. All optional; a missing key degrades the
    // corresponding feature instead of failing startup.
    pub youtube_api_key: Option<String>,
    pub pse_api_key: Option<String>,
    pub pse_cx: Option<String>,
    pub openai_api_key: Option<String>,
    #[serde(default = "default_intent_model")]
    pub intent_model: String,
    pub admin_health_key: Option<String>,

    /// Which backend serves candidate search: `pse` or `youtube`.
    #[serde(default = "default_search_backend")]
    pub search_backend: SearchBackend,
    /// Set to false to skip stats enrichment entirely (quota protection).
    #[serde(default = "default_true")]
    pub enable_yt_hydrate: bool,
    /// Set to false to disable the comments endpoint.
    #[serde(default = "default_true")]
    pub enable_yt_comments: bool,

    /// Base URL for the daily feed JSON files (`{base}/today.json`).
    pub daily_base_url: Option<String>,
    /// Comma-separated default feed queries.
    pub bloom_default_feed: Option<String>,

    // Result cache
    #[serde(default = "default_search_cache_ttl_secs")]
    pub search_cache_ttl_secs: u64,
    #[serde(default = "default_search_cache_capacity")]
    pub search_cache_capacity: usize,
    #[serde(default = "default_suggest_cache_ttl_secs")]
    pub suggest_cache_ttl_secs: u64,

    // Rate limiting
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,

    // Aggregation pipeline
    #[serde(default = "default_results_limit")]
    pub results_limit: usize,
    #[serde(default = "default_per_query_results")]
    pub per_query_results: usize,
    #[serde(default = "default_candidate_ceiling")]
    pub candidate_ceiling: usize,

    // Scoring weights. Treated as a configuration surface: historical
    // deployments shipped several variants of these constants.
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,
    #[serde(default = "default_channel_penalty")]
    pub channel_penalty: f64,
    #[serde(default = "default_recency_half_life_days")]
    pub recency_half_life_days: f64,
    #[serde(default = "default_duration_bonus_threshold_secs")]
    pub duration_bonus_threshold_secs: u64,
    #[serde(default = "default_duration_bonus")]
    pub duration_bonus: f64,

    // Upstream timeouts
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default = "default_suggest_timeout_ms")]
    pub suggest_timeout_ms: u64,
    #[serde(default = "default_comment_timeout_ms")]
    pub comment_timeout_ms: u64,
    #[serde(default = "default_comments_per_video")]
    pub comments_per_video: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    Pse,
    Youtube,
}

impl Config {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    /// How long in-flight requests get to drain after a shutdown signal.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Default feed queries, either from `BLOOM_DEFAULT_FEED` or the
    /// built-in fallback list.
    pub fn default_feed_queries(&self) -> Vec<String> {
        if let Some(raw) = self.bloom_default_feed.as_deref() {
            let parsed: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_owned)
                .collect();
            if !parsed.is_empty() {
                return parsed;
            }
        }
        FALLBACK_FEED_QUERIES.iter().map(|q| q.to_string()).collect()
    }
}

fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_shutdown_timeout() -> u64 {
    10
}
fn default_intent_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_search_backend() -> SearchBackend {
    SearchBackend::Pse
}
fn default_true() -> bool {
    true
}
fn default_search_cache_ttl_secs() -> u64 {
    120
}
fn default_search_cache_capacity() -> usize {
    5000
}
fn default_suggest_cache_ttl_secs() -> u64 {
    600
}
fn default_rate_limit_window_ms() -> u64 {
    60_000
}
fn default_rate_limit_max() -> u32 {
    10
}
fn default_results_limit() -> usize {
    8
}
fn default_per_query_results() -> usize {
    15
}
fn default_candidate_ceiling() -> usize {
    60
}
fn default_recency_weight() -> f64 {
    0.5
}
fn default_channel_penalty() -> f64 {
    0.2
}
fn default_recency_half_life_days() -> f64 {
    60.0
}
fn default_duration_bonus_threshold_secs() -> u64 {
    600
}
fn default_duration_bonus() -> f64 {
    0.25
}
fn default_upstream_timeout_secs() -> u64 {
    10
}
fn default_suggest_timeout_ms() -> u64 {
    1_500
}
fn default_comment_timeout_ms() -> u64 {
    1_000
}
fn default_comments_per_video() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_from(value: serde_json::Value) -> Config {
        serde_json::from_value(value).expect("defaults should satisfy every field")
    }

    #[test]
    fn defaults_satisfy_every_field() {
        let config = config_from(json!({}));
        assert_eq!(config.rate_limit_max, 10);
        assert_eq!(config.results_limit, 8);
        assert_eq!(config.search_backend, SearchBackend::Pse);
        assert!(config.enable_yt_hydrate);
        assert!(config.youtube_api_key.is_none());
    }

    #[test]
    fn shutdown_grace_tracks_configured_seconds() {
        let config = config_from(json!({}));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(10));

        let config = config_from(json!({"shutdown_timeout": 3}));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(3));
    }

    #[test]
    fn default_feed_queries_parses_list() {
        let config = config_from(json!({"bloom_default_feed": "cats, dogs , ,birds"}));
        assert_eq!(config.default_feed_queries(), vec!["cats", "dogs", "birds"]);
    }

    #[test]
    fn default_feed_queries_falls_back_when_blank() {
        let config = config_from(json!({"bloom_default_feed": " , "}));
        assert_eq!(config.default_feed_queries().len(), 6);
    }
}
