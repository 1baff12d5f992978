//! Daily feed loading with a one-day fallback.
//!
//! The daily list is published as dated JSON files by an external job. A
//! missing feed is not a generic failure: it is a distinct not-found
//! condition carrying the previous date so the caller can offer it
//! explicitly.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyItem {
    pub id: String,
    pub title: String,
    pub source: String,
    pub url: String,
    pub thumb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPayload {
    pub date: String,
    pub items: Vec<DailyItem>,
}

#[derive(Debug, thiserror::Error)]
pub enum DailyError {
    /// Neither today's nor yesterday's feed exists. The previous date is
    /// reported so the UI can name the fallback it tried.
    #[error("daily feed not found (previous date {previous_date})")]
    NotFound { previous_date: String },
}

pub struct DailyClient {
    http: reqwest::Client,
    base_url: Option<String>,
    timeout: Duration,
}

impl DailyClient {
    pub fn new(http: reqwest::Client, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// Today's feed, or yesterday's when today's file isn't published yet.
    pub async fn get_daily(&self) -> Result<DailyPayload, DailyError> {
        let today = Utc::now().date_naive();
        let fallback_date = format_date(today - ChronoDuration::days(1));

        let Some(base) = self.base_url.as_deref() else {
            return Err(DailyError::NotFound {
                previous_date: fallback_date,
            });
        };

        if let Some(payload) = self
            .fetch_payload(&format!("{base}/today.json"), &format_date(today))
            .await
        {
            return Ok(payload);
        }

        debug!(fallback = %fallback_date, "today's feed missing, trying previous day");
        if let Some(payload) = self
            .fetch_payload(&format!("{base}/{fallback_date}.json"), &fallback_date)
            .await
        {
            return Ok(payload);
        }

        Err(DailyError::NotFound {
            previous_date: fallback_date,
        })
    }

    /// Fetch one dated file. Network errors and non-success statuses are
    /// `None` (try the next candidate); a readable body always yields a
    /// payload, however malformed.
    async fn fetch_payload(&self, url: &str, fallback_date: &str) -> Option<DailyPayload> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().await.ok()?;
        Some(parse_payload(&body, fallback_date))
    }
}

/// Shape-tolerant payload parsing: a bad document degrades to an empty item
/// list under the expected date rather than an error.
pub fn parse_payload(body: &str, fallback_date: &str) -> DailyPayload {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            return DailyPayload {
                date: fallback_date.to_owned(),
                items: Vec::new(),
            };
        }
    };

    let date = value
        .get("date")
        .and_then(Value::as_str)
        .unwrap_or(fallback_date)
        .to_owned();
    let items = value
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    DailyPayload { date, items }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_payload() {
        let body = r#"{"date": "2026-08-30", "items": [
            {"id": "a", "title": "T", "source": "youtube",
             "url": "https://www.youtube.com/watch?v=a",
             "thumb": "https://i.ytimg.com/vi/a/hqdefault.jpg",
             "duration": "12:04", "rank": 1}
        ]}"#;
        let payload = parse_payload(body, "2026-08-29");
        assert_eq!(payload.date, "2026-08-30");
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].rank, Some(1));
    }

    #[test]
    fn malformed_body_degrades_to_empty_list() {
        let payload = parse_payload("not json at all", "2026-08-29");
        assert_eq!(payload.date, "2026-08-29");
        assert!(payload.items.is_empty());
    }

    #[test]
    fn wrong_shapes_are_filtered_not_fatal() {
        let body = r#"{"date": 7, "items": [
            {"id": "ok", "title": "T", "source": "youtube", "url": "u", "thumb": "t"},
            {"id": 42},
            "nonsense"
        ]}"#;
        let payload = parse_payload(body, "2026-08-29");
        assert_eq!(payload.date, "2026-08-29");
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].id, "ok");
    }
}
