use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use vidtube_core::{EdgeKind, toggle_edge, views};
use vidtube_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::likes::toggle_response;
use crate::{blocking, respond};

pub async fn toggle_subscription(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let actor = claims.sub;
    let outcome = blocking(&state, move |db| {
        Ok(toggle_edge(db, actor, channel_id, EdgeKind::Subscription)?)
    })
    .await?;
    debug!("User {} toggled subscription to {}: {:?}", actor, channel_id, outcome.state);
    Ok(toggle_response(outcome, "subscribed", "unsubscribed"))
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let members = blocking(&state, move |db| Ok(views::subscribers(db, channel_id)?)).await?;
    Ok(respond(StatusCode::OK, "subscribers fetched", members))
}

pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let channels = blocking(&state, move |db| Ok(views::subscribed_channels(db, subscriber_id)?)).await?;
    Ok(respond(StatusCode::OK, "subscribed channels fetched", channels))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::test_support::{TestApp, register_and_login};

    #[tokio::test]
    async fn subscribe_then_unsubscribe() {
        let app = TestApp::new();
        let channel = register_and_login(&app, "channel").await;
        let fan = register_and_login(&app, "fan").await;
        let toggle = format!("/api/v1/subscriptions/c/{}", channel.user_id);

        let (status, body) = app.request(Method::POST, &toggle, Some(&fan.access_token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["edge"]["subscriber"], fan.user_id.to_string());

        let (_, body) = app.request(Method::GET, &toggle, Some(&fan.access_token), None).await;
        let subscribers = body["data"].as_array().unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0]["username"], "fan");

        let (_, body) = app
            .request(
                Method::GET,
                &format!("/api/v1/subscriptions/u/{}", fan.user_id),
                Some(&fan.access_token),
                None,
            )
            .await;
        assert_eq!(body["data"][0]["id"], channel.user_id.to_string());

        let (_, body) = app
            .request(Method::GET, "/api/v1/users/c/Channel", Some(&fan.access_token), None)
            .await;
        assert_eq!(body["data"]["subscriberCount"], 1);
        assert_eq!(body["data"]["isSubscribed"], true);

        let (status, _) = app.request(Method::POST, &toggle, Some(&fan.access_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = app.request(Method::GET, &toggle, Some(&fan.access_token), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_subscription_is_bad_request() {
        let app = TestApp::new();
        let channel = register_and_login(&app, "channel").await;
        let (status, _) = app
            .request(
                Method::POST,
                &format!("/api/v1/subscriptions/c/{}", channel.user_id),
                Some(&channel.access_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
