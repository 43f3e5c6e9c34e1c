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
use vidtube_types::api::{Claims, PlaylistRequest};
use vidtube_types::models::Playlist;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, ensure_owner, required, respond};

fn owned_playlist(db: &Database, id: Uuid, actor: Uuid) -> Result<Playlist, ApiError> {
    let playlist = db
        .playlists_by_ids(&[id])?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("playlist"))?;
    ensure_owner(playlist.owner_id, actor, "playlist")?;
    Ok(playlist)
}

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PlaylistRequest>,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let playlist = Playlist {
        id: Uuid::new_v4(),
        owner_id: claims.sub,
        name: required("name", &req.name)?,
        description: req.description.trim().to_string(),
        videos: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    let view = blocking(&state, move |db| {
        db.insert_playlist(&playlist)?;
        Ok(views::playlist_by_id(db, playlist.id)?)
    })
    .await?;
    Ok(respond(StatusCode::CREATED, "playlist created", view))
}

pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let playlists = blocking(&state, move |db| Ok(views::user_playlists(db, user_id)?)).await?;
    Ok(respond(StatusCode::OK, "playlists fetched", playlists))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let view = blocking(&state, move |db| Ok(views::playlist_by_id(db, playlist_id)?)).await?;
    Ok(respond(StatusCode::OK, "playlist fetched", view))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PlaylistRequest>,
) -> Result<Response, ApiError> {
    let name = required("name", &req.name)?;
    let description = req.description.trim().to_string();
    let view = blocking(&state, move |db| {
        owned_playlist(db, playlist_id, claims.sub)?;
        db.update_playlist(playlist_id, &name, &description)?;
        Ok(views::playlist_by_id(db, playlist_id)?)
    })
    .await?;
    Ok(respond(StatusCode::OK, "playlist updated", view))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    blocking(&state, move |db| {
        owned_playlist(db, playlist_id, claims.sub)?;
        db.delete_playlist(playlist_id)?;
        Ok(())
    })
    .await?;
    Ok(respond(StatusCode::OK, "playlist deleted", serde_json::json!({})))
}

pub async fn add_video(
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let view = blocking(&state, move |db| {
        owned_playlist(db, playlist_id, claims.sub)?;
        views::video_by_id(db, video_id, claims.sub)?;
        db.add_playlist_video(playlist_id, video_id)?;
        Ok(views::playlist_by_id(db, playlist_id)?)
    })
    .await?;
    Ok(respond(StatusCode::OK, "video added to playlist", view))
}

pub async fn remove_video(
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let view = blocking(&state, move |db| {
        owned_playlist(db, playlist_id, claims.sub)?;
        if !db.remove_playlist_video(playlist_id, video_id)? {
            return Err(ApiError::NotFound("video is not in this playlist".into()));
        }
        Ok(views::playlist_by_id(db, playlist_id)?)
    })
    .await?;
    Ok(respond(StatusCode::OK, "video removed from playlist", view))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{TestApp, publish, register_and_login};

    #[tokio::test]
    async fn playlist_add_and_remove() {
        let app = TestApp::new();
        let owner = register_and_login(&app, "owner").await;
        let other = register_and_login(&app, "other").await;
        let video = publish(&app, &owner, "clip").await;

        let (status, body) = app
            .request(
                Method::POST,
                "/api/v1/playlists",
                Some(&owner.access_token),
                Some(json!({ "name": "mix", "description": "weekend" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["owner"]["username"], "owner");
        let playlist = body["data"]["id"].as_str().unwrap().to_string();

        let add = format!("/api/v1/playlists/add/{}/{}", video, playlist);
        let (status, _) = app.request(Method::PATCH, &add, Some(&other.access_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        app.request(Method::PATCH, &add, Some(&owner.access_token), None).await;
        let (status, body) = app.request(Method::PATCH, &add, Some(&owner.access_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 2);

        let remove = format!("/api/v1/playlists/remove/{}/{}", video, playlist);
        let (_, body) = app.request(Method::PATCH, &remove, Some(&owner.access_token), None).await;
        assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 1);

        let (_, body) = app
            .request(
                Method::GET,
                &format!("/api/v1/playlists/user/{}", owner.user_id),
                Some(&other.access_token),
                None,
            )
            .await;
        assert_eq!(body["data"][0]["name"], "mix");

        let (status, _) = app
            .request(
                Method::DELETE,
                &format!("/api/v1/playlists/{}", playlist),
                Some(&owner.access_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app
            .request(Method::GET, &format!("/api/v1/playlists/{}", playlist), Some(&owner.access_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
