use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::router::booking_routes;
use business_cell::router::business_routes;
use chat_cell::router::chat_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Imara API is running!" }))
        .nest("/businesses", business_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/chat", chat_routes(state))
}
