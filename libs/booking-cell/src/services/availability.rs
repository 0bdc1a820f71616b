// libs/booking-cell/src/services/availability.rs
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;
use shared_models::time::minute_of_day;

use crate::models::{Booking, BookingError, BookingStatus};

/// Whether a booking in this status holds its slot against new proposals.
/// Pending bookings block too: they express intent and must not be
/// double-sold while awaiting confirmation.
pub fn blocks_new_bookings(status: &BookingStatus) -> bool {
    matches!(status, BookingStatus::Pending | BookingStatus::Confirmed)
}

/// Half-open interval overlap on minutes-of-day. Touching endpoints do not
/// conflict: a booking ending at 10:00 coexists with one starting at 10:00.
pub fn intervals_overlap(start1: i32, end1: i32, start2: i32, end2: i32) -> bool {
    start1 < end2 && end1 > start2
}

/// Decide whether the proposed interval is free of conflicts against the
/// given bookings. Only same-day bookings in a blocking status count.
pub fn is_interval_free(
    existing: &[Booking],
    date: NaiveDate,
    start_time: NaiveTime,
    duration_minutes: i32,
) -> bool {
    let proposed_start = minute_of_day(start_time);
    let proposed_end = proposed_start + duration_minutes;

    !existing
        .iter()
        .filter(|b| b.date == date && blocks_new_bookings(&b.status))
        .any(|b| intervals_overlap(proposed_start, proposed_end, b.start_minute(), b.end_minute()))
}

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Check whether a proposed booking interval is still free.
    ///
    /// Advisory only: nothing stops another client from taking the slot
    /// between this check and the write, so the write path re-validates. A
    /// failed fetch is an error, never "available".
    pub async fn check_slot_available(
        &self,
        business_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: i32,
        exclude_booking_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, BookingError> {
        if duration_minutes <= 0 {
            return Err(BookingError::ValidationError(format!(
                "Duration must be positive, got {}",
                duration_minutes
            )));
        }

        if minute_of_day(start_time) + duration_minutes > 24 * 60 {
            return Err(BookingError::InvalidTime(
                "Booking would run past midnight".to_string(),
            ));
        }

        debug!(
            "Checking availability for business {} on {} at {} for {} minutes",
            business_id, date, start_time, duration_minutes
        );

        let existing = self
            .blocking_bookings_for_day(business_id, date, exclude_booking_id, auth_token)
            .await?;

        let available = is_interval_free(&existing, date, start_time, duration_minutes);
        if !available {
            warn!(
                "Slot conflict for business {} on {} at {}",
                business_id, date, start_time
            );
        }

        Ok(available)
    }

    /// Bookings that hold their slot on the given day, earliest first.
    pub async fn blocking_bookings_for_day(
        &self,
        business_id: Uuid,
        date: NaiveDate,
        exclude_booking_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        let mut query_parts = vec![
            format!("business_id=eq.{}", business_id),
            format!("date=eq.{}", date),
            "status=in.(pending,confirmed)".to_string(),
        ];

        if let Some(exclude_id) = exclude_booking_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!(
            "/rest/v1/bookings?{}&order=start_time.asc",
            query_parts.join("&")
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Booking>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse bookings: {}", e)))
    }
}
