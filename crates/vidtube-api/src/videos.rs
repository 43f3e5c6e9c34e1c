use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use vidtube_core::{EntityStore, views};
use vidtube_db::Database;
use vidtube_types::api::{Claims, PublishVideoRequest, UpdateVideoRequest, VideoListQuery};
use vidtube_types::models::Video;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, ensure_owner, required, respond};

/// The video, if `actor` owns it.
fn owned_video(db: &Database, id: Uuid, actor: Uuid) -> Result<Video, ApiError> {
    let video = db.video_by_id(id)?.ok_or_else(|| ApiError::not_found("video"))?;
    ensure_owner(video.owner_id, actor, "video")?;
    Ok(video)
}

pub async fn publish_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PublishVideoRequest>,
) -> Result<Response, ApiError> {
    let title = required("title", &req.title)?;
    let description = required("description", &req.description)?;
    let video_ref = required("videoRef", &req.video_ref)?;
    let thumbnail_ref = required("thumbnailRef", &req.thumbnail_ref)?;
    if !req.duration.is_finite() || req.duration < 0.0 {
        return Err(ApiError::bad_request("duration must be a non-negative number"));
    }

    let now = Utc::now();
    let video = Video {
        id: Uuid::new_v4(),
        owner_id: claims.sub,
        video_ref,
        thumbnail_ref,
        title,
        description,
        duration: req.duration,
        is_published: true,
        created_at: now,
        updated_at: now,
    };

    let view = blocking(&state, move |db| {
        db.insert_video(&video)?;
        info!("User {} published video {}", video.owner_id, video.id);
        Ok(views::video_by_id(db, video.id, video.owner_id)?)
    })
    .await?;

    Ok(respond(StatusCode::CREATED, "video published", view))
}

pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let videos = blocking(&state, move |db| Ok(views::videos_by_owner(db, query.user_id, claims.sub)?)).await?;
    Ok(respond(StatusCode::OK, "videos fetched", videos))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let view = blocking(&state, move |db| Ok(views::video_by_id(db, video_id, claims.sub)?)).await?;
    Ok(respond(StatusCode::OK, "video fetched", view))
}

pub async fn update_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateVideoRequest>,
) -> Result<Response, ApiError> {
    let title = required("title", &req.title)?;
    let description = required("description", &req.description)?;
    let thumbnail_ref = match req.thumbnail_ref.as_deref() {
        Some(thumbnail) => Some(required("thumbnailRef", thumbnail)?),
        None => None,
    };

    let view = blocking(&state, move |db| {
        owned_video(db, video_id, claims.sub)?;
        db.update_video(video_id, &title, &description, thumbnail_ref.as_deref())?;
        Ok(views::video_by_id(db, video_id, claims.sub)?)
    })
    .await?;

    Ok(respond(StatusCode::OK, "video updated", view))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    blocking(&state, move |db| {
        owned_video(db, video_id, claims.sub)?;
        db.delete_video(video_id)?;
        info!("User {} deleted video {}", claims.sub, video_id);
        Ok(())
    })
    .await?;

    Ok(respond(StatusCode::OK, "video deleted", serde_json::json!({})))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let view = blocking(&state, move |db| {
        let video = owned_video(db, video_id, claims.sub)?;
        db.set_video_published(video_id, !video.is_published)?;
        Ok(views::video_by_id(db, video_id, claims.sub)?)
    })
    .await?;

    Ok(respond(StatusCode::OK, "publish status toggled", view))
}

/// Appends the video to the caller's watch history.
pub async fn record_view(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    blocking(&state, move |db| {
        views::video_by_id(db, video_id, claims.sub)?;
        db.push_watch_history(claims.sub, video_id)?;
        Ok(())
    })
    .await?;

    Ok(respond(StatusCode::OK, "view recorded", serde_json::json!({})))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{TestApp, publish, register_and_login};

    #[tokio::test]
    async fn unpublished_videos_are_hidden_from_others() {
        let app = TestApp::new();
        let owner = register_and_login(&app, "owner").await;
        let viewer = register_and_login(&app, "viewer").await;
        let video = publish(&app, &owner, "draft").await;
        let uri = format!("/api/v1/videos/{}", video);

        let (status, body) = app
            .request(Method::PATCH, &format!("{}/toggle-publish", uri), Some(&owner.access_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isPublished"], false);

        let (status, _) = app.request(Method::GET, &uri, Some(&viewer.access_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.request(Method::GET, &uri, Some(&owner.access_token), None).await;
        assert_eq!(status, StatusCode::OK);

        let list = format!("/api/v1/videos?userId={}", owner.user_id);
        let (_, body) = app.request(Method::GET, &list, Some(&viewer.access_token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unpublishing_hides_video_everywhere_for_others() {
        let app = TestApp::new();
        let owner = register_and_login(&app, "owner").await;
        let fan = register_and_login(&app, "fan").await;
        let video = publish(&app, &owner, "clip").await;
        let uri = format!("/api/v1/videos/{}", video);
        let like = format!("/api/v1/likes/toggle/v/{}", video);

        app.request(Method::POST, &format!("{}/view", uri), Some(&fan.access_token), None)
            .await;
        let (status, _) = app.request(Method::POST, &like, Some(&fan.access_token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        app.request(Method::PATCH, &format!("{}/toggle-publish", uri), Some(&owner.access_token), None)
            .await;

        let (status, _) = app.request(Method::GET, &uri, Some(&fan.access_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.request(Method::POST, &like, Some(&fan.access_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = app.request(Method::GET, "/api/v1/likes/videos", Some(&fan.access_token), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
        let (_, body) = app.request(Method::GET, "/api/v1/users/history", Some(&fan.access_token), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_owner_can_edit_or_delete() {
        let app = TestApp::new();
        let owner = register_and_login(&app, "owner").await;
        let viewer = register_and_login(&app, "viewer").await;
        let video = publish(&app, &owner, "clip").await;
        let uri = format!("/api/v1/videos/{}", video);
        let edit = json!({ "title": "renamed", "description": "new words" });

        let (status, _) = app
            .request(Method::PATCH, &uri, Some(&viewer.access_token), Some(edit.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.request(Method::DELETE, &uri, Some(&viewer.access_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .request(Method::PATCH, &uri, Some(&owner.access_token), Some(edit))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "renamed");
        assert_eq!(body["data"]["thumbnailRef"], "thumbs/clip.jpg");

        let (status, _) = app.request(Method::DELETE, &uri, Some(&owner.access_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.request(Method::GET, &uri, Some(&owner.access_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_video_id_is_bad_request() {
        let app = TestApp::new();
        let owner = register_and_login(&app, "owner").await;
        let (status, _) = app
            .request(Method::GET, "/api/v1/videos/not-a-uuid", Some(&owner.access_token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn views_feed_watch_history() {
        let app = TestApp::new();
        let owner = register_and_login(&app, "owner").await;
        let viewer = register_and_login(&app, "viewer").await;
        let first = publish(&app, &owner, "first").await;
        let second = publish(&app, &owner, "second").await;

        for video in [first, second, first] {
            let (status, _) = app
                .request(
                    Method::POST,
                    &format!("/api/v1/videos/{}/view", video),
                    Some(&viewer.access_token),
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = app
            .request(Method::GET, "/api/v1/users/history", Some(&viewer.access_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let history = body["data"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["id"], first.to_string());
        assert_eq!(history[1]["id"], second.to_string());
        assert_eq!(history[0]["owner"]["email"], "owner@example.com");
    }
}
