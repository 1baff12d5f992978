//! Google Programmable Search client.
//!
//! Searches a PSE instance scoped to YouTube and extracts candidate videos
//! from result links plus whatever pagemap metadata each result carries.
//! The API caps pages at 10 results, so one logical search may issue a
//! second paged request when the caller wants more.

use crate::counters::{Counter, RollingCounters};
use crate::search::engine::SearchProvider;
use crate::search::VideoCandidate;
use crate::upstream::{UpstreamError, check_status};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

const PSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
/// The API rejects `num` above 10.
const PAGE_SIZE: usize = 10;

pub struct PseClient {
    http: reqwest::Client,
    api_key: Option<String>,
    cx: Option<String>,
    counters: Arc<RollingCounters>,
    timeout: Duration,
}

impl PseClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        cx: Option<String>,
        counters: Arc<RollingCounters>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            api_key,
            cx,
            counters,
            timeout,
        }
    }

    async fn fetch_page(&self, query: &str, start: usize) -> Result<Value, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential("PSE_API_KEY"))?;
        let cx = self
            .cx
            .as_deref()
            .ok_or(UpstreamError::MissingCredential("PSE_CX"))?;

        self.counters.record(Counter::PseRequests);
        let response = self
            .http
            .get(PSE_ENDPOINT)
            .query(&[
                ("key", api_key),
                ("cx", cx),
                ("q", query),
                ("num", &PAGE_SIZE.to_string()),
                ("start", &start.to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(UpstreamError::RequestFailed)
    }
}

#[async_trait]
impl SearchProvider for PseClient {
    async fn search(
        &self,
        query: &str,
        max: usize,
    ) -> Result<Vec<VideoCandidate>, UpstreamError> {
        let mut results = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let first = self.fetch_page(query, 1).await?;
        ingest_page(&first, max, &mut seen, &mut results);

        // A second page fills out the batch; its failure only shortens the
        // result list.
        if results.len() < max {
            match self.fetch_page(query, PAGE_SIZE + 1).await {
                Ok(second) => ingest_page(&second, max, &mut seen, &mut results),
                Err(e) => warn!(query = %query, error = %e, "PSE second page failed"),
            }
        }

        Ok(results)
    }
}

fn ingest_page(
    page: &Value,
    max: usize,
    seen: &mut HashSet<String>,
    out: &mut Vec<VideoCandidate>,
) {
    let Some(items) = page.get("items").and_then(Value::as_array) else {
        return;
    };
    for item in items {
        if out.len() >= max {
            break;
        }
        let Some(candidate) = candidate_from_item(item) else {
            continue;
        };
        if seen.insert(candidate.video_id.clone()) {
            out.push(candidate);
        }
    }
}

/// Build a candidate from a single PSE result, or `None` when the link is
/// not a YouTube watch URL. Metadata fields cascade through the pagemap
/// shapes PSE is known to emit.
fn candidate_from_item(item: &Value) -> Option<VideoCandidate> {
    let link = item.get("link").and_then(Value::as_str)?;
    let video_id = watch_id_from_link(link)?;

    let title = item
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let channel_title = item
        .pointer("/pagemap/person/0/name")
        .or_else(|| item.pointer("/pagemap/videoobject/0/author"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let thumbnail_url = item
        .pointer("/pagemap/cse_thumbnail/0/src")
        .or_else(|| item.pointer("/pagemap/videoobject/0/thumbnailurl"))
        .or_else(|| item.pointer("/pagemap/metatags/0/og:image"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg"));
    let published_at = item
        .pointer("/pagemap/videoobject/0/uploaddate")
        .or_else(|| item.pointer("/pagemap/metatags/0/og:video:release_date"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    Some(VideoCandidate {
        youtube_url: VideoCandidate::watch_url(&video_id),
        video_id,
        title,
        channel_title,
        thumbnail_url,
        published_at,
        duration_seconds: 0,
        view_count: 0,
    })
}

/// Extract the `v` parameter from a YouTube watch link.
fn watch_id_from_link(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?;
    if !host.contains("youtube.com") || url.path() != "/watch" {
        return None;
    }
    url.query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn watch_id_requires_watch_path_on_youtube() {
        assert_eq!(
            watch_id_from_link("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(watch_id_from_link("https://www.youtube.com/shorts/abc"), None);
        assert_eq!(watch_id_from_link("https://vimeo.com/watch?v=abc"), None);
        assert_eq!(watch_id_from_link("https://www.youtube.com/watch"), None);
        assert_eq!(watch_id_from_link("not a url"), None);
    }

    #[test]
    fn candidate_reads_pagemap_with_fallbacks() {
        let item = json!({
            "link": "https://www.youtube.com/watch?v=abc12345678",
            "title": "A video",
            "pagemap": {
                "videoobject": [{"author": "Some Channel", "uploaddate": "2026-01-15T00:00:00Z"}],
                "metatags": [{"og:image": "https://example.com/thumb.jpg"}]
            }
        });
        let candidate = candidate_from_item(&item).expect("candidate");
        assert_eq!(candidate.video_id, "abc12345678");
        assert_eq!(candidate.channel_title, "Some Channel");
        assert_eq!(candidate.thumbnail_url, "https://example.com/thumb.jpg");
        assert_eq!(candidate.published_at, "2026-01-15T00:00:00Z");
        assert_eq!(candidate.duration_seconds, 0);
    }

    #[test]
    fn candidate_defaults_thumbnail_to_ytimg() {
        let item = json!({
            "link": "https://www.youtube.com/watch?v=xyz",
            "title": "Bare result"
        });
        let candidate = candidate_from_item(&item).expect("candidate");
        assert_eq!(
            candidate.thumbnail_url,
            "https://i.ytimg.com/vi/xyz/hqdefault.jpg"
        );
        assert!(candidate.channel_title.is_empty());
    }

    #[test]
    fn ingest_dedupes_and_respects_max() {
        let page = json!({"items": [
            {"link": "https://www.youtube.com/watch?v=a", "title": "1"},
            {"link": "https://www.youtube.com/watch?v=a", "title": "dup"},
            {"link": "https://www.youtube.com/watch?v=b", "title": "2"},
            {"link": "https://www.youtube.com/watch?v=c", "title": "3"},
        ]});
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        ingest_page(&page, 2, &mut seen, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].video_id, "a");
        assert_eq!(out[1].video_id, "b");
    }
}
