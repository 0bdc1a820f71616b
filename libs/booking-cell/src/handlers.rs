// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use business_cell::services::business::BusinessService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AvailabilityQuery, BookingError, CancelBookingRequest, ClientBookingsQuery,
    CreateBookingRequest,
};
use crate::services::booking::BookingService;

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::NotFound => AppError::NotFound("Booking not found".to_string()),
        BookingError::SlotNotAvailable => {
            AppError::BadRequest("Booking slot not available".to_string())
        }
        BookingError::ConflictDetected => AppError::Conflict(
            "Slot no longer available, please pick another time".to_string(),
        ),
        BookingError::InvalidStatusTransition(status) => {
            AppError::BadRequest(format!("Cannot transition from current status: {}", status))
        }
        BookingError::InvalidTime(msg) => AppError::BadRequest(msg),
        BookingError::ValidationError(msg) => AppError::BadRequest(msg),
        BookingError::Unauthorized => {
            AppError::Auth("Not authorized to access this booking".to_string())
        }
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn is_admin(user: &User) -> bool {
    user.role.as_deref() == Some("admin")
}

async fn is_business_owner(
    state: &Arc<AppConfig>,
    business_id: Uuid,
    user: &User,
    token: &str,
) -> Result<bool, AppError> {
    let business_service = BusinessService::new(state);
    let business = business_service
        .get_business(business_id, token)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(business.owner_id.to_string() == user.id)
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    // Only the client themselves or an admin can create the booking
    let is_client = request.client_id.to_string() == user.id;
    if !is_client && !is_admin(&user) {
        return Err(AppError::Auth(
            "Not authorized to book for this client".to_string(),
        ));
    }

    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .create_booking(request, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Booking created, awaiting confirmation"
    })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .get_booking(booking_id, token)
        .await
        .map_err(map_booking_error)?;

    let is_client = booking.client_id.to_string() == user.id;
    let is_owner = is_business_owner(&state, booking.business_id, &user, token).await?;

    if !is_client && !is_owner && !is_admin(&user) {
        return Err(AppError::Auth("Not authorized to view this booking".to_string()));
    }

    Ok(Json(json!(booking)))
}

/// Advisory availability probe for the booking screen. A failing bookings
/// fetch surfaces as an error here, never as "available".
#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AvailabilityQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let available = booking_service
        .availability()
        .check_slot_available(
            query.business_id,
            query.date,
            query.start_time,
            query.duration_minutes,
            None,
            token,
        )
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({ "available": available })))
}

#[axum::debug_handler]
pub async fn confirm_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .get_booking(booking_id, token)
        .await
        .map_err(map_booking_error)?;

    let is_owner = is_business_owner(&state, booking.business_id, &user, token).await?;
    if !is_owner && !is_admin(&user) {
        return Err(AppError::Auth(
            "Only the business owner can confirm a booking".to_string(),
        ));
    }

    let confirmed = booking_service
        .confirm_booking(booking_id, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": confirmed,
        "message": "Booking confirmed"
    })))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .get_booking(booking_id, token)
        .await
        .map_err(map_booking_error)?;

    let is_client = booking.client_id.to_string() == user.id;
    let is_owner = is_business_owner(&state, booking.business_id, &user, token).await?;

    if !is_client && !is_owner && !is_admin(&user) {
        return Err(AppError::Auth("Not authorized to cancel this booking".to_string()));
    }

    let cancelled = booking_service
        .cancel_booking(booking_id, request, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": cancelled,
        "message": "Booking cancelled"
    })))
}

#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .get_booking(booking_id, token)
        .await
        .map_err(map_booking_error)?;

    let is_owner = is_business_owner(&state, booking.business_id, &user, token).await?;
    if !is_owner && !is_admin(&user) {
        return Err(AppError::Auth(
            "Only the business owner can complete a booking".to_string(),
        ));
    }

    let completed = booking_service
        .complete_booking(booking_id, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": completed
    })))
}

#[axum::debug_handler]
pub async fn mark_no_show(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let booking = booking_service
        .get_booking(booking_id, token)
        .await
        .map_err(map_booking_error)?;

    let is_owner = is_business_owner(&state, booking.business_id, &user, token).await?;
    if !is_owner && !is_admin(&user) {
        return Err(AppError::Auth(
            "Only the business owner can mark a no-show".to_string(),
        ));
    }

    let updated = booking_service
        .mark_no_show(booking_id, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": updated
    })))
}

#[axum::debug_handler]
pub async fn get_client_bookings(
    State(state): State<Arc<AppConfig>>,
    Path(client_id): Path<Uuid>,
    Query(query): Query<ClientBookingsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if client_id.to_string() != user.id && !is_admin(&user) {
        return Err(AppError::Auth(
            "Not authorized to view this client's bookings".to_string(),
        ));
    }

    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .client_bookings(client_id, query.status, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "count": bookings.len(),
        "bookings": bookings
    })))
}

#[axum::debug_handler]
pub async fn get_business_bookings(
    State(state): State<Arc<AppConfig>>,
    Path(business_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let is_owner = is_business_owner(&state, business_id, &user, token).await?;
    if !is_owner && !is_admin(&user) {
        return Err(AppError::Auth(
            "Not authorized to view this business's bookings".to_string(),
        ));
    }

    let booking_service = BookingService::new(&state);

    let bookings = booking_service
        .business_bookings(business_id, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "count": bookings.len(),
        "bookings": bookings
    })))
}
