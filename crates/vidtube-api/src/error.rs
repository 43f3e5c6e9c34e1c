use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use vidtube_core::{CoreError, StoreError};
use vidtube_types::api::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(kind: &str) -> Self {
        ApiError::NotFound(format!("{} not found", kind))
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidArgument(message) => ApiError::BadRequest(message),
            CoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CoreError::Conflict(message) => ApiError::Conflict(message),
            CoreError::StoreFailure(inner) => ApiError::Internal(anyhow::Error::new(inner)),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(err) => {
                error!("Request failed: {:#}", err);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ApiResponse::empty(status.as_u16(), message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::invalid("bad id"), StatusCode::BAD_REQUEST),
            (CoreError::not_found("video", "v1"), StatusCode::NOT_FOUND),
            (CoreError::Conflict("raced".into()), StatusCode::CONFLICT),
            (
                CoreError::StoreFailure(StoreError::from(anyhow::anyhow!("disk gone"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (core, status) in cases {
            assert_eq!(ApiError::from(core).status(), status);
        }
    }

    #[test]
    fn not_found_keeps_entity_kind() {
        let err = ApiError::from(CoreError::not_found("channel", "bob"));
        assert_eq!(err.to_string(), "channel not found: bob");
    }
}
