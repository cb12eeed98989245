use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{MessageList, StatusUpdate, StatusUpdated, SubmitRequest, SubmitResponse},
    repo::{MessageStatus, NewMessage},
};
use crate::{
    auth::middleware::require_auth,
    db::bounded,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/contact/submit", post(submit))
}

pub fn inbox_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/contact/messages", get(list_messages))
        .route("/contact/messages/:id/status", put(update_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let Json(body) = payload?;
    if body.name.is_empty() || body.email.is_empty() || body.message.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, email, and message are required".into(),
        ));
    }

    let msg = NewMessage {
        name: body.name,
        email: body.email,
        phone: non_empty(body.phone),
        company: non_empty(body.company),
        service: non_empty(body.service),
        message: body.message,
    };
    let id = bounded(state.config.store_timeout, state.contacts.insert(msg)).await?;
    info!(message_id = %id, "contact message stored");

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Message submitted successfully",
            id,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn list_messages(State(state): State<AppState>) -> ApiResult<Json<MessageList>> {
    let messages = bounded(state.config.store_timeout, state.contacts.list()).await?;
    Ok(Json(MessageList { messages }))
}

#[instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<StatusUpdated>> {
    let Path(id) = id.map_err(|_| ApiError::NotFound("Message not found".into()))?;
    let Json(body) = payload?;
    let status: MessageStatus = body.status.parse().map_err(|_| {
        ApiError::BadRequest("status must be one of new, read, replied".into())
    })?;

    let found = bounded(
        state.config.store_timeout,
        state.contacts.set_status(id, status),
    )
    .await?;
    if !found {
        warn!(message_id = %id, "status update for unknown message");
        return Err(ApiError::NotFound("Message not found".into()));
    }

    Ok(Json(StatusUpdated {
        message: "Status updated successfully",
    }))
}
