//! YouTube Data API v3 client: candidate search and stats enrichment.

use crate::counters::{Counter, RollingCounters};
use crate::search::engine::{SearchProvider, StatsProvider};
use crate::search::{VideoCandidate, VideoStats};
use crate::upstream::json::parse_json_with_context;
use crate::upstream::{UpstreamError, check_status};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const YT_API: &str = "https://www.googleapis.com/youtube/v3";
/// The `videos` endpoint accepts at most 50 ids per call.
const STATS_BATCH_MAX: usize = 50;
/// The `search` endpoint page cap used by this client.
const SEARCH_MAX: usize = 15;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<SearchItemId>,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    channel_title: Option<String>,
    published_at: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: Option<String>,
    content_details: Option<ContentDetails>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
}

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: Option<String>,
    counters: Arc<RollingCounters>,
    timeout: Duration,
}

impl YouTubeClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        counters: Arc<RollingCounters>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            api_key,
            counters,
            timeout,
        }
    }

    fn key(&self) -> Result<&str, UpstreamError> {
        self.api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential("YOUTUBE_API_KEY"))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let response = self
            .http
            .get(format!("{YT_API}/{path}"))
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        parse_json_with_context(&body).map_err(|source| UpstreamError::ParseFailed { source })
    }
}

#[async_trait]
impl SearchProvider for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        max: usize,
    ) -> Result<Vec<VideoCandidate>, UpstreamError> {
        let key = self.key()?;
        let max_results = max.min(SEARCH_MAX).to_string();
        let data: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("q", query),
                    ("maxResults", &max_results),
                    ("safeSearch", "none"),
                    ("key", key),
                ],
            )
            .await?;

        let results = data
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.and_then(|id| id.video_id)?;
                let snippet = item.snippet;
                let thumbnails = snippet.as_ref().and_then(|s| s.thumbnails.as_ref());
                Some(VideoCandidate {
                    youtube_url: VideoCandidate::watch_url(&video_id),
                    title: snippet
                        .as_ref()
                        .and_then(|s| s.title.clone())
                        .unwrap_or_default(),
                    channel_title: snippet
                        .as_ref()
                        .and_then(|s| s.channel_title.clone())
                        .unwrap_or_default(),
                    thumbnail_url: thumbnails
                        .and_then(|t| t.high.as_ref().or(t.default.as_ref()))
                        .and_then(|t| t.url.clone())
                        .unwrap_or_default(),
                    published_at: snippet
                        .and_then(|s| s.published_at)
                        .unwrap_or_default(),
                    video_id,
                    duration_seconds: 0,
                    view_count: 0,
                })
            })
            .collect();
        Ok(results)
    }
}

#[async_trait]
impl StatsProvider for YouTubeClient {
    async fn stats(&self, ids: &[String]) -> Result<Vec<VideoStats>, UpstreamError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let key = self.key()?;
        let id_param = ids
            .iter()
            .take(STATS_BATCH_MAX)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        self.counters.record(Counter::YtHydrateRequests);
        let result: Result<VideosResponse, UpstreamError> = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,contentDetails,statistics"),
                    ("id", &id_param),
                    ("key", key),
                ],
            )
            .await;

        let data = match result {
            Ok(data) => data,
            Err(e) => {
                if e.is_quota_exceeded() {
                    self.counters.record(Counter::YtHydrateQuotaExceeded);
                }
                return Err(e);
            }
        };

        let stats = data
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id?;
                Some(VideoStats {
                    duration_seconds: item
                        .content_details
                        .and_then(|cd| cd.duration)
                        .map(|d| parse_iso8601_duration(&d))
                        .unwrap_or(0),
                    view_count: item
                        .statistics
                        .and_then(|s| s.view_count)
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0),
                    video_id,
                })
            })
            .collect();
        Ok(stats)
    }
}

/// Parse an ISO-8601 video duration (`PT1H2M3S`) into seconds. Anything
/// unparseable is zero, matching the "zeros until enriched" contract.
pub fn parse_iso8601_duration(iso: &str) -> u64 {
    static DURATION_RE: OnceLock<Regex> = OnceLock::new();
    let re = DURATION_RE
        .get_or_init(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("valid regex"));

    let Some(caps) = re.captures(iso) else {
        return 0;
    };
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    part(1) * 3600 + part(2) * 60 + part(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_durations() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), 3723);
        assert_eq!(parse_iso8601_duration("PT10M"), 600);
        assert_eq!(parse_iso8601_duration("PT45S"), 45);
        assert_eq!(parse_iso8601_duration("PT2H"), 7200);
    }

    #[test]
    fn junk_durations_are_zero() {
        assert_eq!(parse_iso8601_duration(""), 0);
        assert_eq!(parse_iso8601_duration("P1D"), 0);
        assert_eq!(parse_iso8601_duration("garbage"), 0);
    }

    #[test]
    fn search_response_tolerates_missing_fields() {
        let body = r#"{"items": [
            {"id": {"videoId": "abc"}, "snippet": {"title": "T"}},
            {"id": {}, "snippet": {"title": "skipped, no id"}},
            {"id": {"videoId": "def"}}
        ]}"#;
        let parsed: SearchResponse = parse_json_with_context(body).expect("parse");
        assert_eq!(parsed.items.len(), 3);
        assert_eq!(
            parsed.items[0].id.as_ref().and_then(|i| i.video_id.as_deref()),
            Some("abc")
        );
    }
}
