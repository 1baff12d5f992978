//! Health and metrics handlers.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::trace;

use crate::counters::CountersSnapshot;
use crate::state::AppState;

/// Deep probes get a short leash so a slow upstream can't stall the probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HealthParams {
    pub key: Option<String>,
    pub deep: bool,
}

/// `GET /api/health`
///
/// Public shape is status/uptime/commit. With the admin key, configuration
/// presence flags are included; with `deep`, the LLM and video upstreams
/// are probed live.
pub(super) async fn health(
    State(state): State<AppState>,
    Query(params): Query<HealthParams>,
) -> Json<Value> {
    trace!("health check requested");

    let mut body = json!({
        "status": "ok",
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("GIT_COMMIT_HASH"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    let authorized = match (&state.config.admin_health_key, &params.key) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    };
    if !authorized {
        return Json(body);
    }

    body["env"] = json!({
        "youtubeApiKey": state.config.youtube_api_key.is_some(),
        "pseApiKey": state.config.pse_api_key.is_some(),
        "pseCx": state.config.pse_cx.is_some(),
        "openaiApiKey": state.config.openai_api_key.is_some(),
        "searchBackend": format!("{:?}", state.config.search_backend).to_lowercase(),
        "hydrateEnabled": state.config.enable_yt_hydrate,
        "commentsEnabled": state.config.enable_yt_comments,
    });

    if params.deep {
        let (openai, youtube) =
            tokio::join!(probe_openai(&state), probe_youtube(&state));
        body["probes"] = json!({ "openai": openai, "youtube": youtube });
    }

    Json(body)
}

/// `GET /api/metrics` -- rolling upstream request counters.
pub(super) async fn metrics(State(state): State<AppState>) -> Json<CountersSnapshot> {
    Json(state.counters.snapshot())
}

async fn probe_openai(state: &AppState) -> Value {
    let Some(key) = state.config.openai_api_key.as_deref() else {
        return json!({ "ok": false, "reason": "unconfigured" });
    };
    match state
        .http
        .get("https://api.openai.com/v1/models")
        .bearer_auth(key)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => json!({ "ok": response.status().is_success(), "status": response.status().as_u16() }),
        Err(e) => json!({ "ok": false, "reason": e.to_string() }),
    }
}

async fn probe_youtube(state: &AppState) -> Value {
    let Some(key) = state.config.youtube_api_key.as_deref() else {
        return json!({ "ok": false, "reason": "unconfigured" });
    };
    match state
        .http
        .get("https://www.googleapis.com/youtube/v3/i18nLanguages")
        .query(&[("part", "snippet"), ("key", key)])
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => json!({ "ok": response.status().is_success(), "status": response.status().as_u16() }),
        Err(e) => json!({ "ok": false, "reason": e.to_string() }),
    }
}
