//! Comment enrichment handler.

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::collections::HashMap;

use crate::state::AppState;
use crate::upstream::comments::CommentRecord;
use crate::web::routes::{cache, with_cache_control};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentsParams {
    pub ids: String,
}

/// `GET /api/comments?ids=a,b,c` -- a map of video id to its top comments.
/// Empty input, a disabled feature flag, and upstream failures all produce
/// an empty (or partial) map, never an error.
pub(super) async fn comments(
    State(state): State<AppState>,
    Query(params): Query<CommentsParams>,
) -> Response {
    let ids: Vec<String> = params
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect();

    if ids.is_empty() || !state.config.enable_yt_comments {
        let empty: HashMap<String, Vec<CommentRecord>> = HashMap::new();
        return with_cache_control(empty, cache::COMMENTS);
    }

    let map = state
        .comments
        .top_comments_batch(&ids, state.config.comments_per_video)
        .await;
    with_cache_control(map, cache::COMMENTS)
}
