//! Daily-rotation queue endpoints.
//!
//! The client supplies a session id, the day key, and how many items its
//! feed holds; the server owns the shuffle salt and the stored position. A
//! zero item count (or a blank date) clears the stored state.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::rotation::{self, QueueState};
use crate::state::AppState;
use crate::web::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueParams {
    pub session_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub item_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueResponse {
    pub state: Option<QueueView>,
}

/// Stored state plus the derived fields clients actually render.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub order: Vec<usize>,
    pub current: usize,
    pub seen: BTreeSet<usize>,
    pub presented: Vec<usize>,
    pub active: Option<usize>,
}

impl QueueView {
    fn from_state(state: &QueueState) -> Self {
        Self {
            order: state.order.clone(),
            current: state.current,
            seen: state.seen.clone(),
            presented: state.presented(),
            active: state.active(),
        }
    }
}

fn validate(params: &QueueParams) -> Result<(), ApiError> {
    if params.session_id.trim().is_empty() {
        return Err(ApiError::bad_request(
            "missing_session",
            "sessionId is required",
        ));
    }
    Ok(())
}

/// `GET /api/queue` -- load the stored state for (session, date), or
/// initialize a fresh deterministic shuffle. Clears on empty input.
pub(super) async fn get_queue(
    State(state): State<AppState>,
    Query(params): Query<QueueParams>,
) -> Result<Json<QueueResponse>, ApiError> {
    validate(&params)?;
    Ok(Json(resolve(&state, &params, Transition::None)))
}

/// `POST /api/queue/advance`
pub(super) async fn advance(
    State(state): State<AppState>,
    Json(params): Json<QueueParams>,
) -> Result<Json<QueueResponse>, ApiError> {
    validate(&params)?;
    Ok(Json(resolve(&state, &params, Transition::Advance)))
}

/// `POST /api/queue/retreat`
pub(super) async fn retreat(
    State(state): State<AppState>,
    Json(params): Json<QueueParams>,
) -> Result<Json<QueueResponse>, ApiError> {
    validate(&params)?;
    Ok(Json(resolve(&state, &params, Transition::Retreat)))
}

enum Transition {
    None,
    Advance,
    Retreat,
}

/// Initialize-or-load, apply the transition, persist, and report. Every
/// path goes through `rotation::initialize` so a stale or corrupt stored
/// state is regenerated rather than trusted.
fn resolve(state: &AppState, params: &QueueParams, transition: Transition) -> QueueResponse {
    let session = params.session_id.trim();
    let date_key = params.date.trim();

    if params.item_count == 0 || date_key.is_empty() {
        state.queues.clear(session, date_key);
        return QueueResponse { state: None };
    }

    let salt = state.queues.salt(session);
    let stored = state.queues.load(session, date_key);
    let Some(queue) = rotation::initialize(params.item_count, date_key, salt, stored) else {
        return QueueResponse { state: None };
    };

    let queue = match transition {
        Transition::None => queue,
        Transition::Advance => queue.advance(),
        Transition::Retreat => queue.retreat(),
    };

    state.queues.save(session, date_key, queue.clone());
    QueueResponse {
        state: Some(QueueView::from_state(&queue)),
    }
}
