//! LLM query translation and prompt suggestions.
//!
//! Both operations are opaque text-in/JSON-out calls to a chat-completion
//! API and both are contractually infallible: the translator falls back to
//! echoing the raw prompt, the suggester to a static idea list.

use crate::upstream::{UpstreamError, check_status};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::warn;

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const TRANSLATE_SYSTEM: &str = "You convert a messy user request into 2-3 concise YouTube search \
     queries. Respond ONLY with JSON: {\"queries\":[\"...\"]}.";

const SUGGEST_SYSTEM: &str = "You produce short, clickable prompt ideas for a video discovery app.\n\
     Return ONLY JSON of the form: {\"suggestions\":[\"...\"]}.\n\
     Guidelines:\n\
     - 4-8 words each, no punctuation at the end, no quotes.\n\
     - Diverse but coherent; avoid duplicates.\n\
     - If \"input\" is non-empty, bias suggestions to be natural next-steps for that input.\n\
     - If \"savedTitles\" are provided, infer the user's tastes and include 2-3 that reflect them.\n\
     - Keep them safe and generic; don't include offensive/NSFW content.";

/// Static ideas served when the model returns nothing usable.
const FALLBACK_SUGGESTIONS: &[&str] = &[
    "deep dive interviews",
    "quiet train rides",
    "tech founders talks",
    "cinematic nature scenes",
    "history explainers",
    "chill jazz concert",
];

/// Refinement hint appended to a translation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Refine {
    Weirder,
    Newer,
    Longer,
}

impl Refine {
    fn as_str(self) -> &'static str {
        match self {
            Refine::Weirder => "weirder",
            Refine::Newer => "newer",
            Refine::Longer => "longer",
        }
    }
}

pub struct IntentClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    translate_timeout: Duration,
    suggest_timeout: Duration,
}

impl IntentClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        model: String,
        translate_timeout: Duration,
        suggest_timeout: Duration,
    ) -> Self {
        Self {
            http,
            api_key,
            model,
            translate_timeout,
            suggest_timeout,
        }
    }

    /// Turn a free-text prompt into 1-3 search queries. Always returns at
    /// least one query: the prompt itself when the model is unavailable or
    /// answers with something unusable.
    pub async fn translate(&self, prompt: &str, refine: Option<Refine>) -> Vec<String> {
        let user = match refine {
            Some(refine) => format!("{prompt}\nRefine: {}", refine.as_str()),
            None => prompt.to_owned(),
        };

        match self
            .completion(TRANSLATE_SYSTEM, &user, 0.2, self.translate_timeout)
            .await
        {
            Ok(content) => parse_string_list(&content, "queries")
                .filter(|queries| !queries.is_empty())
                .unwrap_or_else(|| vec![prompt.to_owned()]),
            Err(e) => {
                warn!(error = %e, "query translation failed, echoing prompt");
                vec![prompt.to_owned()]
            }
        }
    }

    /// Prompt-bar suggestions biased by current input and saved titles.
    pub async fn suggest(&self, input: &str, saved_titles: &[String]) -> Vec<String> {
        let user = json!({
            "input": input,
            "savedTitles": saved_titles.iter().take(20).collect::<Vec<_>>(),
        })
        .to_string();

        let parsed = match self
            .completion(SUGGEST_SYSTEM, &user, 0.7, self.suggest_timeout)
            .await
        {
            Ok(content) => parse_string_list(&content, "suggestions").unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "suggestion call failed");
                Vec::new()
            }
        };

        if parsed.is_empty() {
            FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
        } else {
            parsed
        }
    }

    async fn completion(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        timeout: Duration,
    ) -> Result<String, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential("OPENAI_API_KEY"))?;

        let body = json!({
            "model": self.model,
            "temperature": temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let response = self
            .http
            .post(COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(&body)
            .timeout(timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        let data: Value = response.json().await?;

        data.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| UpstreamError::ParseFailed {
                source: anyhow::anyhow!("completion had no message content"),
            })
    }
}

/// Parse `{"<field>": ["..."]}` out of a model response, dropping
/// non-string entries. `None` when the payload isn't that shape.
fn parse_string_list(content: &str, field: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(content).ok()?;
    let list = value.get(field)?.as_array()?;
    Some(
        list.iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_lists() {
        let parsed = parse_string_list(r#"{"queries": ["a", "b"]}"#, "queries");
        assert_eq!(parsed, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn drops_non_string_entries() {
        let parsed = parse_string_list(r#"{"queries": ["a", 3, null]}"#, "queries");
        assert_eq!(parsed, Some(vec!["a".to_string()]));
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert_eq!(parse_string_list("not json", "queries"), None);
        assert_eq!(parse_string_list(r#"{"queries": "a"}"#, "queries"), None);
        assert_eq!(parse_string_list(r#"{"other": []}"#, "queries"), None);
    }
}
