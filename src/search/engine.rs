//! Fan-out aggregation and ranking pipeline.
//!
//! One call: fan out a search per query, merge and dedupe by video id,
//! enrich the candidate batch with stats, score, diversify, and truncate.
//! Everything upstream-facing fails soft; the only externally visible
//! failure signal is the `degraded` flag.

use crate::cache::TtlCache;
use crate::search::scoring::{base_score, jitter};
use crate::search::{EngineConfig, VideoCandidate, VideoStats};
use crate::upstream::UpstreamError;
use crate::util::Clock;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Candidate search backend (Programmable Search or the Data API).
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max: usize)
    -> Result<Vec<VideoCandidate>, UpstreamError>;
}

/// Batch statistics backend (duration and view counts).
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn stats(&self, ids: &[String]) -> Result<Vec<VideoStats>, UpstreamError>;
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub exclude_ids: Vec<String>,
    pub seed: Option<i64>,
}

impl SearchOptions {
    /// Canonical requests (no exclusions, no seed) are the only ones that
    /// may read from or write to the shared cache.
    fn is_canonical(&self) -> bool {
        self.exclude_ids.is_empty() && self.seed.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<VideoCandidate>,
    pub degraded: bool,
}

impl SearchOutcome {
    fn degraded_empty() -> Self {
        Self {
            results: Vec::new(),
            degraded: true,
        }
    }
}

pub struct SearchEngine {
    provider: Arc<dyn SearchProvider>,
    stats: Arc<dyn StatsProvider>,
    cache: TtlCache<Arc<Vec<VideoCandidate>>>,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        stats: Arc<dyn StatsProvider>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = TtlCache::new(config.cache_ttl, config.cache_capacity, clock);
        Self {
            provider,
            stats,
            cache,
            config,
        }
    }

    /// Run the full aggregation pipeline for a set of queries.
    pub async fn search(&self, queries: &[String], options: &SearchOptions) -> SearchOutcome {
        let queries: Vec<&str> = queries
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .collect();
        if queries.is_empty() {
            return SearchOutcome::degraded_empty();
        }

        let key = cache_key(&queries);
        if options.is_canonical()
            && let Some(hit) = self.cache.get(&key)
        {
            debug!(queries = queries.len(), "search cache hit");
            return SearchOutcome {
                results: (*hit).clone(),
                degraded: false,
            };
        }

        let candidates = self.fan_out(&queries, &options.exclude_ids).await;
        if candidates.is_empty() {
            return SearchOutcome::degraded_empty();
        }

        let (mut candidates, degraded) = self.enrich(candidates).await;
        self.rank(&mut candidates, options.seed);
        candidates.truncate(self.config.results_limit);

        if options.is_canonical() && !degraded {
            self.cache.insert(key, Arc::new(candidates.clone()));
        }

        SearchOutcome {
            results: candidates,
            degraded,
        }
    }

    /// Issue one upstream search per query in parallel, then merge in
    /// query-list order so identical inputs always merge identically.
    /// First occurrence of a video id wins; excluded ids are skipped.
    async fn fan_out(&self, queries: &[&str], exclude_ids: &[String]) -> Vec<VideoCandidate> {
        let exclude: HashSet<&str> = exclude_ids.iter().map(String::as_str).collect();
        let batches = join_all(
            queries
                .iter()
                .map(|q| self.provider.search(q, self.config.per_query_results)),
        )
        .await;

        let mut merged: IndexMap<String, VideoCandidate> = IndexMap::new();
        'collect: for (query, batch) in queries.iter().zip(batches) {
            let batch = match batch {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(query = %query, error = %e, "upstream search failed");
                    continue;
                }
            };
            for candidate in batch {
                if merged.len() >= self.config.candidate_ceiling {
                    break 'collect;
                }
                if exclude.contains(candidate.video_id.as_str())
                    || merged.contains_key(&candidate.video_id)
                {
                    continue;
                }
                merged.insert(candidate.video_id.clone(), candidate);
            }
        }
        merged.into_values().collect()
    }

    /// Merge duration/view-count stats onto the candidate set. A failed or
    /// partial enrichment leaves zeros in place and flags the result
    /// degraded; it never aborts the pipeline.
    async fn enrich(&self, mut candidates: Vec<VideoCandidate>) -> (Vec<VideoCandidate>, bool) {
        if !self.config.hydrate_enabled {
            return (candidates, true);
        }

        let ids: Vec<String> = candidates
            .iter()
            .take(self.config.stats_batch)
            .map(|c| c.video_id.clone())
            .collect();

        match self.stats.stats(&ids).await {
            Ok(stats) => {
                let matched = stats.len();
                let by_id: HashMap<String, VideoStats> =
                    stats.into_iter().map(|s| (s.video_id.clone(), s)).collect();
                for candidate in &mut candidates {
                    if let Some(stat) = by_id.get(&candidate.video_id) {
                        candidate.duration_seconds = stat.duration_seconds;
                        candidate.view_count = stat.view_count;
                    }
                }
                (candidates, matched != ids.len())
            }
            Err(e) => {
                warn!(error = %e, ids = ids.len(), "stats enrichment failed");
                (candidates, true)
            }
        }
    }

    /// Score, diversify, and order candidates in place.
    ///
    /// The channel penalty is a greedy single pass in descending base-score
    /// order, so ties keep their upstream merge order (both sorts are
    /// stable).
    fn rank(&self, candidates: &mut Vec<VideoCandidate>, seed: Option<i64>) {
        let now = Utc::now();
        let weights = &self.config.weights;

        let mut scored: Vec<(VideoCandidate, f64)> = candidates
            .drain(..)
            .map(|c| {
                let base = base_score(&c, now, weights);
                (c, base)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut channel_counts: HashMap<String, u32> = HashMap::new();
        for (candidate, score) in &mut scored {
            let count = channel_counts
                .entry(candidate.channel_title.clone())
                .or_insert(0);
            *score -= weights.channel_penalty * f64::from(*count);
            if let Some(seed) = seed {
                *score += jitter(&candidate.video_id, seed);
            }
            *count += 1;
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        *candidates = scored.into_iter().map(|(c, _)| c).collect();
    }
}

/// Stable cache key over the canonical query list.
fn cache_key(queries: &[&str]) -> String {
    serde_json::to_string(queries).unwrap_or_else(|_| queries.join("\u{1f}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_and_distinguishes_lists() {
        assert_eq!(cache_key(&["a", "b"]), cache_key(&["a", "b"]));
        assert_ne!(cache_key(&["a", "b"]), cache_key(&["b", "a"]));
        assert_ne!(cache_key(&["ab"]), cache_key(&["a", "b"]));
    }
}
