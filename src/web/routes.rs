//! Router construction and shared response utilities.

use axum::http::HeaderValue;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

use crate::state::AppState;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::{comments, daily, intent, queue, search, status, suggest};

/// Cache-Control presets for public endpoints.
///
/// The CDN respects `s-maxage` for edge caching and
/// `stale-while-revalidate` for serving stale content while re-fetching.
pub mod cache {
    /// Search results and the default feed. Short: the in-process cache
    /// already absorbs repeats, the edge just smooths bursts.
    pub const SEARCH: &str = "public, max-age=30, s-maxage=60, stale-while-revalidate=60";
    /// Daily curated list, refreshed once a day upstream.
    pub const DAILY: &str = "public, max-age=300, s-maxage=3600, stale-while-revalidate=600";
    /// Comment batches.
    pub const COMMENTS: &str = "public, max-age=60, s-maxage=300, stale-while-revalidate=120";
}

/// Wraps a JSON response with a `Cache-Control` header.
pub fn with_cache_control<T: serde::Serialize>(value: T, header: &'static str) -> Response {
    let mut response = Json(value).into_response();
    response.headers_mut().insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(header),
    );
    response
}

/// Creates the web server router
pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/metrics", get(status::metrics))
        .route("/search", post(search::search))
        .route("/feed", get(search::initial_feed))
        .route("/intent", post(intent::intent))
        .route("/suggest", post(suggest::suggest))
        .route("/comments", get(comments::comments))
        .route("/daily", get(daily::daily))
        .route("/queue", get(queue::get_queue))
        .route("/queue/advance", post(queue::advance))
        .route("/queue/retreat", post(queue::retreat))
        .with_state(app_state);

    let router = Router::new().nest("/api", api_router);

    router.layer((
        // Outermost: per-request ID span + severity-proportional response logging.
        RequestIdLayer,
        CorsLayer::permissive(),
        CompressionLayer::new()
            .zstd(true)
            .br(true)
            .gzip(true)
            .quality(tower_http::CompressionLevel::Fastest),
        TimeoutLayer::new(Duration::from_secs(30)),
    ))
}
