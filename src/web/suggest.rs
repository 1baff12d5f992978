//! Prompt suggestion handler with short-lived caching.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

const MAX_SUGGESTIONS: usize = 6;
/// Only the first few saved titles influence suggestions (and the cache key).
const KEYED_TITLES: usize = 12;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestRequest {
    pub input: String,
    pub saved_titles: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

/// `POST /api/suggest`
pub(super) async fn suggest(
    State(state): State<AppState>,
    Json(request): Json<SuggestRequest>,
) -> Json<SuggestResponse> {
    let input = request.input.trim().to_lowercase();
    let titles: Vec<&String> = request.saved_titles.iter().take(KEYED_TITLES).collect();
    let key = json!({ "i": input, "s": titles }).to_string();

    if let Some(hit) = state.suggest_cache.get(&key) {
        return Json(SuggestResponse {
            suggestions: (*hit).clone(),
            cached: true,
        });
    }

    let mut suggestions = state
        .intent
        .suggest(&input, &request.saved_titles)
        .await;
    suggestions.truncate(MAX_SUGGESTIONS);

    state.suggest_cache.insert(key, Arc::new(suggestions.clone()));
    Json(SuggestResponse {
        suggestions,
        cached: false,
    })
}
