//! Mapping of domain failures onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{
    auth::{middleware::AccessError, services::AuthError},
    db::StoreError,
};

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
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(err) => {
                error!(error = ?err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingField(field) => ApiError::BadRequest(format!("{} is required", field)),
            AuthError::InvalidEmail => ApiError::BadRequest("Invalid email".into()),
            AuthError::InvalidAccountCategory => ApiError::BadRequest(
                "userType must be one of importer, exporter, both".into(),
            ),
            AuthError::DuplicateEmail => {
                ApiError::BadRequest("User already exists with this email".into())
            }
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".into())
            }
            AuthError::NotFound => ApiError::NotFound("User not found".into()),
            AuthError::Store(e) => ApiError::Internal(e.into()),
            AuthError::Hashing(e) => ApiError::Internal(e.into()),
            AuthError::Token(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::MissingToken => ApiError::Unauthorized("Access token required".into()),
            AccessError::InvalidToken => ApiError::Forbidden("Invalid or expired token".into()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn auth_errors_map_to_fixed_statuses() {
        let cases = [
            (AuthError::MissingField("name"), StatusCode::BAD_REQUEST),
            (AuthError::InvalidEmail, StatusCode::BAD_REQUEST),
            (AuthError::DuplicateEmail, StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::NotFound, StatusCode::NOT_FOUND),
            (
                AuthError::Store(StoreError::Timeout),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn access_errors_distinguish_missing_from_invalid() {
        let missing = ApiError::from(AccessError::MissingToken).into_response();
        let invalid = ApiError::from(AccessError::InvalidToken).into_response();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn store_errors_are_internal() {
        let res = ApiError::from(StoreError::Timeout).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(res).await["error"], "Internal server error");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err = ApiError::from(AuthError::Store(StoreError::CorruptRow(
            "users.user_type = 'x' at row 42".into(),
        )));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(res).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(!body.to_string().contains("row 42"));
    }
}
