//! Application state shared across handlers.

use crate::cache::TtlCache;
use crate::config::{Config, SearchBackend};
use crate::counters::RollingCounters;
use crate::daily::DailyClient;
use crate::ratelimit::RateLimiter;
use crate::rotation::store::SessionQueueStore;
use crate::search::engine::{SearchEngine, SearchProvider, StatsProvider};
use crate::search::EngineConfig;
use crate::upstream::comments::CommentsClient;
use crate::upstream::intent::IntentClient;
use crate::upstream::pse::PseClient;
use crate::upstream::youtube::YouTubeClient;
use crate::util::system_clock;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// How often the idle-bucket sweeper runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// Queue states untouched this long are dropped (covers a full day key
/// rollover with margin).
const QUEUE_MAX_IDLE: Duration = Duration::from_secs(36 * 60 * 60);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub engine: Arc<SearchEngine>,
    pub intent: Arc<IntentClient>,
    pub comments: Arc<CommentsClient>,
    pub daily: Arc<DailyClient>,
    pub suggest_cache: Arc<TtlCache<Arc<Vec<String>>>>,
    pub limiter: Arc<RateLimiter>,
    pub counters: Arc<RollingCounters>,
    pub queues: Arc<SessionQueueStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let clock = system_clock();
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let counters = Arc::new(RollingCounters::new(clock.clone()));

        let youtube = Arc::new(YouTubeClient::new(
            http.clone(),
            config.youtube_api_key.clone(),
            counters.clone(),
            config.upstream_timeout(),
        ));
        let provider: Arc<dyn SearchProvider> = match config.search_backend {
            SearchBackend::Pse => Arc::new(PseClient::new(
                http.clone(),
                config.pse_api_key.clone(),
                config.pse_cx.clone(),
                counters.clone(),
                config.upstream_timeout(),
            )),
            SearchBackend::Youtube => youtube.clone(),
        };
        let stats: Arc<dyn StatsProvider> = youtube;

        let engine = Arc::new(SearchEngine::new(
            provider,
            stats,
            EngineConfig::from_config(&config),
            clock.clone(),
        ));

        let intent = Arc::new(IntentClient::new(
            http.clone(),
            config.openai_api_key.clone(),
            config.intent_model.clone(),
            config.upstream_timeout(),
            Duration::from_millis(config.suggest_timeout_ms),
        ));
        let comments = Arc::new(CommentsClient::new(
            http.clone(),
            config.youtube_api_key.clone(),
            Duration::from_millis(config.comment_timeout_ms),
        ));
        let daily = Arc::new(DailyClient::new(
            http.clone(),
            config.daily_base_url.clone(),
            config.upstream_timeout(),
        ));

        let suggest_cache = Arc::new(TtlCache::new(
            Duration::from_secs(config.suggest_cache_ttl_secs),
            500,
            clock.clone(),
        ));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_window(),
            config.rate_limit_max,
            clock.clone(),
        ));
        let queues = Arc::new(SessionQueueStore::new(clock));

        Ok(Self {
            config: Arc::new(config),
            http,
            engine,
            intent,
            comments,
            daily,
            suggest_cache,
            limiter,
            counters,
            queues,
            started_at: Instant::now(),
        })
    }

    /// Spawn a background task that prunes idle rate-limit buckets and
    /// stale queue states. The task runs until the process exits.
    pub fn spawn_idle_sweeper(&self) {
        let limiter = self.limiter.clone();
        let queues = self.queues.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await; // skip the immediate first tick
            loop {
                ticker.tick().await;
                let buckets = limiter.sweep_idle();
                let states = queues.sweep_idle(QUEUE_MAX_IDLE);
                if buckets > 0 || states > 0 {
                    debug!(buckets, states, "Idle sweep pruned entries");
                }
            }
        });
    }
}
