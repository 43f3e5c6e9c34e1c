use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use vidtube_db::Database;

use crate::auth::{AppStateInner, AuthSettings};
use crate::router;

/// Full router over a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    _dir: TempDir,
}

pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("vidtube.db")).unwrap();
        let state = Arc::new(AppStateInner {
            db,
            auth: AuthSettings {
                jwt_secret: "test-secret".to_string(),
                access_ttl: Duration::hours(1),
                refresh_ttl: Duration::days(1),
            },
        });
        TestApp {
            router: router(state),
            _dir: dir,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

/// Registers `name` with password `password <name>` and logs in.
pub async fn register_and_login(app: &TestApp, name: &str) -> Session {
    let password = format!("password {}", name);
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/users/register",
            None,
            Some(json!({
                "username": name,
                "email": format!("{}@example.com", name),
                "fullName": format!("{} full", name),
                "password": password,
                "avatar": format!("avatars/{}.png", name),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/users/login",
            None,
            Some(json!({ "login": name, "password": password })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    Session {
        user_id: data["user"]["id"].as_str().unwrap().parse().unwrap(),
        access_token: data["accessToken"].as_str().unwrap().to_string(),
        refresh_token: data["refreshToken"].as_str().unwrap().to_string(),
    }
}

/// Publishes a video owned by `session` and returns its id.
pub async fn publish(app: &TestApp, session: &Session, title: &str) -> Uuid {
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/videos",
            Some(&session.access_token),
            Some(json!({
                "title": title,
                "description": format!("about {}", title),
                "videoRef": format!("videos/{}.mp4", title),
                "thumbnailRef": format!("thumbs/{}.jpg", title),
                "duration": 30.0,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}
