//! Daily feed handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::debug;

use crate::daily::DailyError;
use crate::state::AppState;
use crate::web::routes::{cache, with_cache_control};

/// `GET /api/daily` -- today's curated list, or yesterday's when today's
/// file isn't published. A miss for both days is a 404 naming the fallback
/// date it tried, so the client can show something better than "error".
pub(super) async fn daily(State(state): State<AppState>) -> Response {
    match state.daily.get_daily().await {
        Ok(payload) => {
            debug!(date = %payload.date, items = payload.items.len(), "daily feed served");
            with_cache_control(payload, cache::DAILY)
        }
        Err(DailyError::NotFound { previous_date }) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "previousDate": previous_date })),
        )
            .into_response(),
    }
}
