use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use vidtube_core::{EdgeKind, ToggleOutcome, toggle_edge, views};
use vidtube_types::api::{Claims, ToggleResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, respond};

/// Shared by every toggle route: 201 when the edge was created, 200 when removed.
pub(crate) fn toggle_response(outcome: ToggleOutcome, created: &str, removed: &str) -> Response {
    let (status, message) = if outcome.is_active() {
        (StatusCode::CREATED, created)
    } else {
        (StatusCode::OK, removed)
    };
    respond(
        status,
        message,
        ToggleResponse {
            active: outcome.is_active(),
            edge: outcome.edge,
        },
    )
}

async fn toggle_like(state: AppState, actor: Uuid, target: Uuid, kind: EdgeKind) -> Result<Response, ApiError> {
    let outcome = blocking(&state, move |db| Ok(toggle_edge(db, actor, target, kind)?)).await?;
    debug!("User {} toggled {:?} on {}: {:?}", actor, kind, target, outcome.state);
    Ok(toggle_response(outcome, "liked", "unliked"))
}

pub async fn toggle_video_like(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    toggle_like(state, claims.sub, video_id, EdgeKind::LikeOnVideo).await
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    toggle_like(state, claims.sub, comment_id, EdgeKind::LikeOnComment).await
}

pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    Path(tweet_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    toggle_like(state, claims.sub, tweet_id, EdgeKind::LikeOnTweet).await
}

pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let videos = blocking(&state, move |db| Ok(views::liked_videos(db, claims.sub)?)).await?;
    Ok(respond(StatusCode::OK, "liked videos fetched", videos))
}
