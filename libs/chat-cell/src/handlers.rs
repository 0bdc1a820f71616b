// libs/chat-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{total_unread, ChatError, SendMessageRequest};
use crate::services::chat::ChatService;

fn map_chat_error(e: ChatError) -> AppError {
    match e {
        ChatError::NotFound => AppError::NotFound("Conversation not found".to_string()),
        ChatError::Unauthorized => {
            AppError::Auth("Not a participant of this conversation".to_string())
        }
        ChatError::ValidationError(msg) => AppError::BadRequest(msg),
        ChatError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_conversations(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let chat_service = ChatService::new(&state);

    let conversations = chat_service
        .conversations_for_user(&user, token)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(json!({
        "count": conversations.len(),
        "total_unread": total_unread(&conversations, &user.id),
        "conversations": conversations
    })))
}

#[axum::debug_handler]
pub async fn get_messages(
    State(state): State<Arc<AppConfig>>,
    Path(conversation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let chat_service = ChatService::new(&state);

    let messages = chat_service
        .messages(conversation_id, &user, token)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(json!({
        "count": messages.len(),
        "messages": messages
    })))
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<Arc<AppConfig>>,
    Path(conversation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let chat_service = ChatService::new(&state);

    let message = chat_service
        .send_message(conversation_id, &user, &request.body, token)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(json!({
        "success": true,
        "message": message
    })))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<Arc<AppConfig>>,
    Path(conversation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let chat_service = ChatService::new(&state);

    chat_service
        .mark_read(conversation_id, &user, token)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn archive_conversation(
    State(state): State<Arc<AppConfig>>,
    Path(conversation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let chat_service = ChatService::new(&state);

    chat_service
        .archive_conversation(conversation_id, &user, token)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(json!({ "success": true })))
}
