use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use vidtube_core::EntityStore;
use vidtube_db::Database;
use vidtube_types::api::{Claims, ContentRequest};
use vidtube_types::models::Tweet;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, ensure_owner, required, respond};

fn owned_tweet(db: &Database, id: Uuid, actor: Uuid) -> Result<Tweet, ApiError> {
    let tweet = db.tweet_by_id(id)?.ok_or_else(|| ApiError::not_found("tweet"))?;
    ensure_owner(tweet.owner_id, actor, "tweet")?;
    Ok(tweet)
}

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ContentRequest>,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let tweet = Tweet {
        id: Uuid::new_v4(),
        owner_id: claims.sub,
        content: required("content", &req.content)?,
        created_at: now,
        updated_at: now,
    };
    let tweet = blocking(&state, move |db| {
        db.insert_tweet(&tweet)?;
        Ok(tweet)
    })
    .await?;
    Ok(respond(StatusCode::CREATED, "tweet created", tweet))
}

pub async fn my_tweets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let tweets = blocking(&state, move |db| Ok(db.get_tweets_by_owner(claims.sub)?)).await?;
    Ok(respond(StatusCode::OK, "tweets fetched", tweets))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ContentRequest>,
) -> Result<Response, ApiError> {
    let content = required("content", &req.content)?;
    let tweet = blocking(&state, move |db| {
        owned_tweet(db, tweet_id, claims.sub)?;
        db.update_tweet(tweet_id, &content)?;
        db.tweet_by_id(tweet_id)?.ok_or_else(|| ApiError::not_found("tweet"))
    })
    .await?;
    Ok(respond(StatusCode::OK, "tweet updated", tweet))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    blocking(&state, move |db| {
        owned_tweet(db, tweet_id, claims.sub)?;
        db.delete_tweet(tweet_id)?;
        Ok(())
    })
    .await?;
    Ok(respond(StatusCode::OK, "tweet deleted", serde_json::json!({})))
}
