use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{CircleLeaderboardEntry, DiscussionLeaderboardEntry, Leaderboard, PollLeaderboardEntry},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Number of entries; defaults to the configured top-K
    limit: Option<usize>,
}

/// Unwraps the query string, reporting a malformed `limit` as JSON 400
fn requested_limit(
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> AppResult<Option<usize>> {
    let Query(params) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    Ok(params.limit)
}

/// Handler for the trending polls leaderboard
pub async fn polls(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> AppResult<Json<Leaderboard<PollLeaderboardEntry>>> {
    let limit = requested_limit(query)?;
    tracing::info!(request_id = %request_id, limit = ?limit, "Serving poll leaderboard");
    let board = state.leaderboards.polls(limit).await?;
    Ok(Json(board))
}

/// Handler for the trending discussions leaderboard
pub async fn discussions(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> AppResult<Json<Leaderboard<DiscussionLeaderboardEntry>>> {
    let limit = requested_limit(query)?;
    tracing::info!(request_id = %request_id, limit = ?limit, "Serving discussion leaderboard");
    let board = state.leaderboards.discussions(limit).await?;
    Ok(Json(board))
}

/// Handler for the trending circles leaderboard
pub async fn circles(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> AppResult<Json<Leaderboard<CircleLeaderboardEntry>>> {
    let limit = requested_limit(query)?;
    tracing::info!(request_id = %request_id, limit = ?limit, "Serving circle leaderboard");
    let board = state.leaderboards.circles(limit).await?;
    Ok(Json(board))
}
