//! Search and initial-feed handlers.
//!
//! This endpoint is contractually fail-soft: a malformed body, a dead
//! upstream, or a panic-worthy payload all produce a well-formed 200 with
//! empty degraded results. The only non-200 is the rate-limit rejection.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::ratelimit::RateDecision;
use crate::search::engine::SearchOptions;
use crate::state::AppState;
use crate::web::middleware::client_ip::ClientIp;
use crate::web::routes::{cache, with_cache_control};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub queries: Vec<String>,
    pub exclude_ids: Vec<String>,
    pub seed: Option<i64>,
    pub fresh: bool,
}

/// `POST /api/search`
pub(super) async fn search(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Bytes,
) -> Response {
    let decision = state.limiter.check(ip);
    if decision.limited {
        info!(client = %ip, "search request rate limited");
        return rate_limited_response(&decision);
    }

    // Lenient body handling: an unparseable body is an empty request, not
    // a 400. The engine turns empty queries into a degraded empty result.
    let request: SearchRequest = serde_json::from_slice(&body).unwrap_or_default();

    let options = SearchOptions {
        seed: resolve_seed(request.seed, request.fresh),
        exclude_ids: request.exclude_ids,
    };
    let outcome = state.engine.search(&request.queries, &options).await;
    debug!(
        results = outcome.results.len(),
        degraded = outcome.degraded,
        "search completed"
    );

    with_rate_limit_headers(Json(outcome).into_response(), &decision)
}

/// `GET /api/feed` -- the default feed, served through the same pipeline
/// (and therefore the same cache) as an explicit search for those queries.
pub(super) async fn initial_feed(State(state): State<AppState>) -> Response {
    let queries = state.config.default_feed_queries();
    let outcome = state
        .engine
        .search(&queries, &SearchOptions::default())
        .await;
    with_cache_control(outcome, cache::SEARCH)
}

/// A fresh pull re-rolls the ordering with a random jitter seed, which
/// also keeps the request out of the shared cache. An explicit seed always
/// wins so clients can replay an ordering they already saw.
fn resolve_seed(seed: Option<i64>, fresh: bool) -> Option<i64> {
    match (seed, fresh) {
        (Some(seed), _) => Some(seed),
        (None, true) => Some(i64::from(rand::random::<i32>())),
        (None, false) => None,
    }
}

fn rate_limited_response(decision: &RateDecision) -> Response {
    let response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "results": [], "rateLimited": true })),
    )
        .into_response();
    with_rate_limit_headers(response, decision)
}

fn with_rate_limit_headers(mut response: Response, decision: &RateDecision) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        "x-ratelimit-limit",
        HeaderValue::from_str(&decision.limit.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    headers.insert(
        "x-ratelimit-remaining",
        HeaderValue::from_str(&decision.remaining.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    headers.insert(
        "x-ratelimit-window",
        HeaderValue::from_str(&decision.window.as_millis().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::resolve_seed;

    #[test]
    fn explicit_seed_wins_over_fresh() {
        assert_eq!(resolve_seed(Some(42), true), Some(42));
        assert_eq!(resolve_seed(Some(-7), false), Some(-7));
    }

    #[test]
    fn fresh_without_seed_mints_one() {
        assert!(resolve_seed(None, true).is_some());
    }

    #[test]
    fn plain_request_stays_unseeded() {
        assert_eq!(resolve_seed(None, false), None);
    }
}
