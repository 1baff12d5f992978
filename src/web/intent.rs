//! Prompt-to-queries translation handler.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::AppState;
use crate::upstream::intent::Refine;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentRequest {
    pub prompt: String,
    pub refine: Option<Refine>,
}

#[derive(Serialize)]
pub struct IntentResponse {
    pub queries: Vec<String>,
}

/// `POST /api/intent` -- always yields at least one query, echoing the
/// prompt when the model is unavailable.
pub(super) async fn intent(
    State(state): State<AppState>,
    Json(request): Json<IntentRequest>,
) -> Json<IntentResponse> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Json(IntentResponse { queries: vec![] });
    }

    let queries = state.intent.translate(prompt, request.refine).await;
    debug!(count = queries.len(), "intent translated");
    Json(IntentResponse { queries })
}
