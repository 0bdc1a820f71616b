// libs/business-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{BusinessError, BusinessSearchQuery, SlotQuery};
use crate::services::business::BusinessService;
use crate::services::schedule::ScheduleService;

fn map_business_error(e: BusinessError) -> AppError {
    match e {
        BusinessError::NotFound => AppError::NotFound("Business not found".to_string()),
        BusinessError::InvalidSlotDuration(d) => {
            AppError::BadRequest(format!("Invalid slot duration: {}", d))
        }
        BusinessError::ValidationError(msg) => AppError::BadRequest(msg),
        BusinessError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_business(
    State(state): State<Arc<AppConfig>>,
    Path(business_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let business_service = BusinessService::new(&state);

    let business = business_service
        .get_business(business_id, token)
        .await
        .map_err(map_business_error)?;

    Ok(Json(json!(business)))
}

#[axum::debug_handler]
pub async fn search_businesses(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<BusinessSearchQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let business_service = BusinessService::new(&state);

    let businesses = business_service
        .search_businesses(&query, token)
        .await
        .map_err(map_business_error)?;

    Ok(Json(json!({
        "count": businesses.len(),
        "businesses": businesses
    })))
}

/// Bookable slots for a business on a given date. The wall clock enters here
/// and only here, so the slot calculation itself stays deterministic.
#[axum::debug_handler]
pub async fn get_business_slots(
    State(state): State<Arc<AppConfig>>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let schedule_service = ScheduleService::new(&state);

    let response = schedule_service
        .day_slots(business_id, &query, Utc::now(), token)
        .await
        .map_err(map_business_error)?;

    Ok(Json(json!(response)))
}
