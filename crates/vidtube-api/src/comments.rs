use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use vidtube_core::{EntityStore, views};
use vidtube_db::Database;
use vidtube_types::api::{Claims, ContentRequest};
use vidtube_types::models::Comment;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, ensure_owner, required, respond};

fn owned_comment(db: &Database, id: Uuid, actor: Uuid) -> Result<Comment, ApiError> {
    let comment = db.comment_by_id(id)?.ok_or_else(|| ApiError::not_found("comment"))?;
    ensure_owner(comment.owner_id, actor, "comment")?;
    Ok(comment)
}

pub async fn get_comments(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let comments = blocking(&state, move |db| {
        views::video_by_id(db, video_id, claims.sub)?;
        Ok(views::video_comments(db, video_id)?)
    })
    .await?;
    Ok(respond(StatusCode::OK, "comments fetched", comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ContentRequest>,
) -> Result<Response, ApiError> {
    let content = required("content", &req.content)?;
    let comment = blocking(&state, move |db| {
        views::video_by_id(db, video_id, claims.sub)?;
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            video_id,
            owner_id: claims.sub,
            content,
            created_at: now,
            updated_at: now,
        };
        db.insert_comment(&comment)?;
        Ok(comment)
    })
    .await?;
    Ok(respond(StatusCode::CREATED, "comment added", comment))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ContentRequest>,
) -> Result<Response, ApiError> {
    let content = required("content", &req.content)?;
    let comment = blocking(&state, move |db| {
        owned_comment(db, comment_id, claims.sub)?;
        db.update_comment(comment_id, &content)?;
        db.comment_by_id(comment_id)?.ok_or_else(|| ApiError::not_found("comment"))
    })
    .await?;
    Ok(respond(StatusCode::OK, "comment updated", comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    blocking(&state, move |db| {
        owned_comment(db, comment_id, claims.sub)?;
        db.delete_comment(comment_id)?;
        Ok(())
    })
    .await?;
    Ok(respond(StatusCode::OK, "comment deleted", serde_json::json!({})))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{TestApp, publish, register_and_login};

    #[tokio::test]
    async fn comment_lifecycle() {
        let app = TestApp::new();
        let owner = register_and_login(&app, "owner").await;
        let viewer = register_and_login(&app, "viewer").await;
        let video = publish(&app, &owner, "clip").await;
        let uri = format!("/api/v1/comments/{}", video);

        let (status, body) = app
            .request(Method::POST, &uri, Some(&viewer.access_token), Some(json!({ "content": "first!" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let comment_uri = format!("/api/v1/comments/c/{}", body["data"]["id"].as_str().unwrap());

        let (status, _) = app
            .request(Method::PATCH, &comment_uri, Some(&owner.access_token), Some(json!({ "content": "mine now" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .request(Method::PATCH, &comment_uri, Some(&viewer.access_token), Some(json!({ "content": "edited" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["content"], "edited");

        let (_, body) = app.request(Method::GET, &uri, Some(&owner.access_token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, _) = app.request(Method::DELETE, &comment_uri, Some(&viewer.access_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = app.request(Method::GET, &uri, Some(&owner.access_token), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let app = TestApp::new();
        let owner = register_and_login(&app, "owner").await;
        let video = publish(&app, &owner, "clip").await;
        let (status, _) = app
            .request(
                Method::POST,
                &format!("/api/v1/comments/{}", video),
                Some(&owner.access_token),
                Some(json!({ "content": "   " })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
