use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use vidtube_core::views;
use vidtube_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, respond};

/// Totals for the caller's own channel.
pub async fn channel_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let stats = blocking(&state, move |db| Ok(views::channel_stats(db, claims.sub)?)).await?;
    Ok(respond(StatusCode::OK, "channel stats fetched", stats))
}

/// Every video of the caller's channel, published or not, with engagement counts.
pub async fn channel_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let videos = blocking(&state, move |db| Ok(views::channel_videos(db, claims.sub)?)).await?;
    Ok(respond(StatusCode::OK, "channel videos fetched", videos))
}
