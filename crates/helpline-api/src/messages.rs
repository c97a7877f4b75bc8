use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use helpline_types::api::{
    AdminMessage, DeleteThreadResponse, MarkReadRequest, MarkReadResponse, ReplyRequest,
    SendMessageRequest,
};
use helpline_types::events::{PushKind, PushNotification};
use helpline_types::{Message, MessageId, UserId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::service::MessageService;

/// Run a store call off the async runtime.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&MessageService) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.service))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
}

/// GET /messages: every message with its sender's name, newest first.
pub async fn list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<AdminMessage>>, ApiError> {
    caller.require_admin()?;
    let rows = blocking(&state, |svc| svc.list_all()).await?;
    Ok(Json(rows))
}

/// GET /messages/{user_id}: one thread, oldest first.
pub async fn get_thread(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Message>>, ApiError> {
    caller.require_self_or_admin(user_id)?;
    let messages = blocking(&state, move |svc| svc.list_for_user(user_id)).await?;
    Ok(Json(messages))
}

/// POST /messages: a user-authored message. Anonymous callers post without
/// a `user_id`; signed-in users may only post as themselves.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    match (&caller, req.user_id) {
        (Caller::Anonymous, None) => {}
        (Caller::Anonymous, Some(_)) => return Err(ApiError::Unauthorized),
        (Caller::Authenticated(claims), _) if claims.is_admin() => {
            return Err(ApiError::Forbidden);
        }
        (Caller::Authenticated(claims), user_id) => {
            if user_id.is_some_and(|id| id != claims.sub) {
                return Err(ApiError::Forbidden);
            }
        }
    }

    let user_id = match &caller {
        Caller::Authenticated(claims) => Some(claims.sub),
        Caller::Anonymous => None,
    };

    let created = blocking(&state, move |svc| {
        svc.create_user_message(user_id, &req.message)
    })
    .await?;

    if let (Some(welcome), Some(user_id)) = (&created.welcome, user_id) {
        state
            .push
            .deliver(PushNotification::for_message(PushKind::Welcome, user_id, welcome));
    }

    Ok((StatusCode::CREATED, Json(created.message)))
}

/// POST /messages/reply: an admin-authored message in a user's thread.
pub async fn reply(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    WithRejection(Json(req), _): WithRejection<Json<ReplyRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    caller.require_admin()?;

    let user_id = req.user_id;
    let message = blocking(&state, move |svc| svc.reply(user_id, &req.message)).await?;

    state
        .push
        .deliver(PushNotification::for_message(PushKind::Reply, user_id, &message));

    Ok((StatusCode::CREATED, Json(message)))
}

/// PUT /messages/mark-read: by `user_id` or by `message_ids`, never both.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    WithRejection(Json(req), _): WithRejection<Json<MarkReadRequest>, ApiError>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let owner = caller.owner_scope()?;
    let selector = req.selector()?;

    let updated = blocking(&state, move |svc| svc.mark_read(selector, owner)).await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// DELETE /messages/{id}: one message. End-users only reach their own thread.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<MessageId>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, ApiError> {
    let owner = caller.owner_scope()?;
    blocking(&state, move |svc| svc.delete_message(id, owner)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /messages/thread/{user_id}: the whole thread, irreversibly.
pub async fn delete_thread(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<DeleteThreadResponse>, ApiError> {
    caller.require_self_or_admin(user_id)?;

    let deleted = blocking(&state, move |svc| svc.delete_thread(user_id)).await?;
    info!("Deleted thread for user {} ({} messages)", user_id, deleted);

    Ok(Json(DeleteThreadResponse { deleted }))
}
