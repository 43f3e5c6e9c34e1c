pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod error;
pub mod likes;
pub mod middleware;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod videos;

#[cfg(test)]
mod test_support;

use axum::{
    Json, Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use vidtube_db::Database;
use vidtube_types::api::ApiResponse;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// Wraps `data` in the response envelope.
pub(crate) fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (status, Json(ApiResponse::new(status.as_u16(), message, data))).into_response()
}

/// Trimmed non-empty value of a request field.
pub(crate) fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Only the owner may modify an entity.
pub(crate) fn ensure_owner(owner: Uuid, actor: Uuid, kind: &str) -> Result<(), ApiError> {
    if owner != actor {
        return Err(ApiError::forbidden(format!("only the owner can modify this {}", kind)));
    }
    Ok(())
}

/// Runs synchronous store work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || work(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("worker task failed"))
        })?
}

async fn healthcheck() -> Response {
    respond(StatusCode::OK, "ok", serde_json::json!({ "status": "ok" }))
}

/// All `/api/v1` routes plus the public healthcheck.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/users/register", post(auth::register))
        .route("/users/login", post(auth::login))
        .route("/users/refresh-token", post(auth::refresh_token))
        .route("/healthcheck", get(healthcheck));

    let protected_routes = Router::new()
        .route("/users/logout", post(auth::logout))
        .route("/users/change-password", post(auth::change_password))
        .route("/users/current-user", get(auth::current_user))
        .route("/users/update-account", patch(auth::update_account))
        .route("/users/avatar", patch(auth::update_avatar))
        .route("/users/cover-image", patch(auth::update_cover_image))
        .route("/users/c/{username}", get(auth::channel_profile))
        .route("/users/history", get(auth::watch_history))
        .route("/videos", post(videos::publish_video).get(videos::list_videos))
        .route(
            "/videos/{video_id}",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route("/videos/{video_id}/toggle-publish", patch(videos::toggle_publish))
        .route("/videos/{video_id}/view", post(videos::record_view))
        .route(
            "/comments/{video_id}",
            get(comments::get_comments).post(comments::add_comment),
        )
        .route(
            "/comments/c/{comment_id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/tweets", post(tweets::create_tweet))
        .route("/tweets/user", get(tweets::my_tweets))
        .route(
            "/tweets/{tweet_id}",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        .route("/playlists", post(playlists::create_playlist))
        .route("/playlists/user/{user_id}", get(playlists::user_playlists))
        .route(
            "/playlists/{playlist_id}",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route("/playlists/add/{video_id}/{playlist_id}", patch(playlists::add_video))
        .route("/playlists/remove/{video_id}/{playlist_id}", patch(playlists::remove_video))
        .route("/likes/toggle/v/{video_id}", post(likes::toggle_video_like))
        .route("/likes/toggle/c/{comment_id}", post(likes::toggle_comment_like))
        .route("/likes/toggle/t/{tweet_id}", post(likes::toggle_tweet_like))
        .route("/likes/videos", get(likes::liked_videos))
        .route(
            "/subscriptions/c/{channel_id}",
            post(subscriptions::toggle_subscription).get(subscriptions::channel_subscribers),
        )
        .route("/subscriptions/u/{subscriber_id}", get(subscriptions::subscribed_channels))
        .route("/dashboard/stats", get(dashboard::channel_stats))
        .route("/dashboard/videos", get(dashboard::channel_videos))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .with_state(state)
}
