//! Top-comment batch fetching, bounded and best-effort.
//!
//! Each video gets an independent request with a tight per-item timeout so
//! one slow id cannot stall the batch. Failures map to empty lists; comment
//! availability never affects the main search response.

use crate::upstream::{UpstreamError, check_status};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const YT_API: &str = "https://www.googleapis.com/youtube/v3";
/// Grid-sized chunk: callers never get more ids processed than this.
pub const BATCH_MAX: usize = 12;
/// Upper bound on comments returned per video.
pub const PER_VIDEO_MAX: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    pub author: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

pub struct CommentsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    per_item_timeout: Duration,
}

impl CommentsClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, per_item_timeout: Duration) -> Self {
        Self {
            http,
            api_key,
            per_item_timeout,
        }
    }

    /// Fetch ranked top comments for a deduplicated batch of ids.
    ///
    /// Every requested id appears in the returned map; ids that failed or
    /// timed out map to an empty list.
    pub async fn top_comments_batch(
        &self,
        ids: &[String],
        per_video: usize,
    ) -> HashMap<String, Vec<CommentRecord>> {
        let mut unique: Vec<&str> = Vec::new();
        for id in ids.iter().take(BATCH_MAX) {
            if !unique.contains(&id.as_str()) {
                unique.push(id);
            }
        }
        let per_video = per_video.clamp(1, PER_VIDEO_MAX);

        let fetches = unique.iter().map(|id| async move {
            let comments =
                match tokio::time::timeout(self.per_item_timeout, self.fetch_one(id, per_video))
                    .await
                {
                    Ok(Ok(comments)) => comments,
                    Ok(Err(e)) => {
                        debug!(video_id = %id, error = %e, "comment fetch failed");
                        Vec::new()
                    }
                    Err(_) => {
                        debug!(video_id = %id, "comment fetch timed out");
                        Vec::new()
                    }
                };
            (id.to_string(), comments)
        });

        join_all(fetches).await.into_iter().collect()
    }

    async fn fetch_one(
        &self,
        video_id: &str,
        per_video: usize,
    ) -> Result<Vec<CommentRecord>, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential("YOUTUBE_API_KEY"))?;

        let max_results = per_video.to_string();
        let response = self
            .http
            .get(format!("{YT_API}/commentThreads"))
            .query(&[
                ("part", "snippet"),
                ("videoId", video_id),
                ("maxResults", &max_results),
                ("order", "relevance"),
                ("textFormat", "plainText"),
                ("key", api_key),
            ])
            .timeout(self.per_item_timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        let data: Value = response.json().await?;

        Ok(parse_threads(&data, per_video))
    }
}

fn parse_threads(data: &Value, per_video: usize) -> Vec<CommentRecord> {
    let Some(items) = data.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .take(per_video)
        .map(|item| {
            let snippet = item.pointer("/snippet/topLevelComment/snippet");
            let text_at = |key: &str| {
                snippet
                    .and_then(|s| s.get(key))
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            };
            CommentRecord {
                id: item
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                author: text_at("authorDisplayName").unwrap_or_else(|| "Unknown".to_owned()),
                text: text_at("textDisplay").unwrap_or_default(),
                likes: snippet
                    .and_then(|s| s.get("likeCount"))
                    .and_then(Value::as_u64),
                published_at: text_at("publishedAt"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_thread_snippets() {
        let data = json!({"items": [
            {
                "id": "c1",
                "snippet": {"topLevelComment": {"snippet": {
                    "authorDisplayName": "viewer",
                    "textDisplay": "great video",
                    "likeCount": 12,
                    "publishedAt": "2026-05-01T00:00:00Z"
                }}}
            },
            {"id": "c2"}
        ]});
        let comments = parse_threads(&data, 10);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author, "viewer");
        assert_eq!(comments[0].likes, Some(12));
        assert_eq!(comments[1].author, "Unknown");
        assert!(comments[1].text.is_empty());
    }

    #[test]
    fn truncates_to_per_video_limit() {
        let data = json!({"items": [{"id": "a"}, {"id": "b"}, {"id": "c"}]});
        assert_eq!(parse_threads(&data, 2).len(), 2);
    }

    #[test]
    fn non_list_payload_is_empty() {
        assert!(parse_threads(&json!({"items": "nope"}), 3).is_empty());
        assert!(parse_threads(&json!({}), 3).is_empty());
    }
}
