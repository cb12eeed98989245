use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use tracing::warn;

use super::{
    claims::{Claims, Identity},
    jwt::TokenKeys,
};
use crate::error::ApiError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Verified identity of the caller, placed in request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

pub fn authorize(headers: &HeaderMap, keys: &TokenKeys) -> Result<Claims, AccessError> {
    let token = bearer_token(headers).ok_or(AccessError::MissingToken)?;
    keys.verify(token).map_err(|e| {
        warn!(error = %e, "rejected bearer token");
        AccessError::InvalidToken
    })
}

/// Guards a router: requests without a valid session token never reach it.
pub async fn require_auth(
    State(keys): State<TokenKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authorize(req.headers(), &keys)?;
    req.extensions_mut().insert(AuthUser(claims.identity()));
    Ok(next.run(req).await)
}
