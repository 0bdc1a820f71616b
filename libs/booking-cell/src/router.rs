// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    // All booking operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::create_booking))
        .route("/availability/check", get(handlers::check_availability))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/confirm", post(handlers::confirm_booking))
        .route("/{booking_id}/cancel", post(handlers::cancel_booking))
        .route("/{booking_id}/complete", post(handlers::complete_booking))
        .route("/{booking_id}/no-show", post(handlers::mark_no_show))
        .route("/clients/{client_id}", get(handlers::get_client_bookings))
        .route("/businesses/{business_id}", get(handlers::get_business_bookings))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
