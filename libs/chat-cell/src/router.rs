// libs/chat-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn chat_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/conversations", get(handlers::get_conversations))
        .route("/conversations/{conversation_id}/messages", get(handlers::get_messages))
        .route("/conversations/{conversation_id}/messages", post(handlers::send_message))
        .route("/conversations/{conversation_id}/read", post(handlers::mark_read))
        .route("/conversations/{conversation_id}/archive", post(handlers::archive_conversation))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
