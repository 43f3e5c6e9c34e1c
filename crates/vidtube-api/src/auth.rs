use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{
        SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use vidtube_core::{EntityStore, views};
use vidtube_db::Database;
use vidtube_types::api::{
    ChangePasswordRequest, Claims, LoginRequest, MediaRefRequest, RefreshRequest, RegisterRequest, SessionResponse,
    UpdateAccountRequest,
};
use vidtube_types::models::User;
use vidtube_types::views::AccountView;

use crate::error::ApiError;
use crate::{blocking, required, respond};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub auth: AuthSettings,
}

/// Token signing and lifetime settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let username = required("username", &req.username)?.to_lowercase();
    let email = required("email", &req.email)?.to_lowercase();
    let full_name = required("fullName", &req.full_name)?;
    let avatar = required("avatar", &req.avatar)?;

    // Validate input
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::bad_request("username must be 3 to 32 characters"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("email is invalid"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }

    let password = req.password;
    let cover_image = req.cover_image.filter(|c| !c.trim().is_empty());
    let account = blocking(&state, move |db| {
        if db.get_user_by_username(&username)?.is_some() || db.get_user_by_email(&email)?.is_some() {
            return Err(ApiError::Conflict("user with this username or email already exists".into()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username,
            email,
            full_name,
            avatar,
            cover_image,
            password_hash: hash_password(&password)?,
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        // A concurrent registration can still win between the check and the insert.
        db.create_user(&user)
            .map_err(|e| conflict_if_taken(e, "user with this username or email already exists"))?;
        info!("Registered user {} ({})", user.username, user.id);
        Ok(AccountView::from(&user))
    })
    .await?;

    Ok(respond(StatusCode::CREATED, "user registered", account))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let login = required("login", &req.login)?.to_lowercase();
    let settings = state.auth.clone();

    let session = blocking(&state, move |db| {
        let user = db
            .get_user_by_login(&login)?
            .ok_or_else(|| ApiError::NotFound("user does not exist".into()))?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {}", e))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized("invalid credentials".into()))?;

        issue_session(db, &settings, &user)
    })
    .await?;

    Ok(respond(StatusCode::OK, "logged in", session))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Response, ApiError> {
    let expires_at = refresh_expiry(&req.refresh_token)
        .ok_or_else(|| ApiError::Unauthorized("invalid refresh token".into()))?;
    if expires_at <= Utc::now().timestamp() {
        return Err(ApiError::Unauthorized("refresh token expired".into()));
    }

    let digest = token_digest(&req.refresh_token);
    let settings = state.auth.clone();
    let session = blocking(&state, move |db| {
        let user = db
            .get_user_by_refresh_token(&digest)?
            .ok_or_else(|| ApiError::Unauthorized("refresh token is expired or used".into()))?;
        issue_session(db, &settings, &user)
    })
    .await?;

    Ok(respond(StatusCode::OK, "access token refreshed", session))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    blocking(&state, move |db| Ok(db.set_refresh_token(claims.sub, None)?)).await?;
    Ok(respond(StatusCode::OK, "logged out", serde_json::json!({})))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    if req.new_password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }

    blocking(&state, move |db| {
        let user = current(db, claims.sub)?;
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {}", e))?;
        Argon2::default()
            .verify_password(req.old_password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::bad_request("invalid old password"))?;

        db.set_password(user.id, &hash_password(&req.new_password)?)?;
        Ok(())
    })
    .await?;

    Ok(respond(StatusCode::OK, "password changed", serde_json::json!({})))
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let account = blocking(&state, move |db| Ok(AccountView::from(&current(db, claims.sub)?))).await?;
    Ok(respond(StatusCode::OK, "current user fetched", account))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Response, ApiError> {
    let full_name = required("fullName", &req.full_name)?;
    let email = required("email", &req.email)?.to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::bad_request("email is invalid"));
    }

    let account = blocking(&state, move |db| {
        if db.get_user_by_email(&email)?.is_some_and(|other| other.id != claims.sub) {
            return Err(ApiError::Conflict("email is already in use".into()));
        }
        db.update_account(claims.sub, &full_name, &email)
            .map_err(|e| conflict_if_taken(e, "email is already in use"))?;
        Ok(AccountView::from(&current(db, claims.sub)?))
    })
    .await?;

    Ok(respond(StatusCode::OK, "account details updated", account))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MediaRefRequest>,
) -> Result<Response, ApiError> {
    let url = required("url", &req.url)?;
    let account = blocking(&state, move |db| {
        db.set_avatar(claims.sub, &url)?;
        Ok(AccountView::from(&current(db, claims.sub)?))
    })
    .await?;
    Ok(respond(StatusCode::OK, "avatar updated", account))
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MediaRefRequest>,
) -> Result<Response, ApiError> {
    let url = required("url", &req.url)?;
    let account = blocking(&state, move |db| {
        db.set_cover_image(claims.sub, &url)?;
        Ok(AccountView::from(&current(db, claims.sub)?))
    })
    .await?;
    Ok(respond(StatusCode::OK, "cover image updated", account))
}

pub async fn channel_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let profile = blocking(&state, move |db| Ok(views::channel_profile(db, &username, claims.sub)?)).await?;
    Ok(respond(StatusCode::OK, "channel fetched", profile))
}

pub async fn watch_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let history = blocking(&state, move |db| Ok(views::watch_history(db, claims.sub)?)).await?;
    Ok(respond(StatusCode::OK, "watch history fetched", history))
}

/// The authenticated user; a token for a deleted account is rejected.
fn current(db: &Database, user_id: Uuid) -> Result<User, ApiError> {
    db.user_by_id(user_id)?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))
}

fn conflict_if_taken(err: anyhow::Error, message: &str) -> ApiError {
    if vidtube_db::is_unique_violation(&err) {
        ApiError::Conflict(message.into())
    } else {
        ApiError::Internal(err)
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Mints an access token and rotates the stored refresh token.
fn issue_session(db: &Database, settings: &AuthSettings, user: &User) -> Result<SessionResponse, ApiError> {
    let access_token = create_token(&settings.jwt_secret, settings.access_ttl, user.id, &user.username)?;
    let refresh_token = new_refresh_token(settings.refresh_ttl);
    db.set_refresh_token(user.id, Some(&token_digest(&refresh_token)))?;

    Ok(SessionResponse {
        user: AccountView::from(user),
        access_token,
        refresh_token,
    })
}

pub fn create_token(secret: &str, ttl: Duration, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// `<unix expiry>.<64 hex chars>`. Only the digest is stored, so the
/// expiry prefix cannot be edited without invalidating the token.
fn new_refresh_token(ttl: Duration) -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("{}.{}", (Utc::now() + ttl).timestamp(), hex::encode(bytes))
}

fn refresh_expiry(token: &str) -> Option<i64> {
    let (expiry, secret) = token.split_once('.')?;
    if secret.len() != 64 || !secret.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    expiry.parse().ok()
}

fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
