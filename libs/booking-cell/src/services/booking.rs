// libs/booking-cell/src/services/booking.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use business_cell::services::business::BusinessService;
use chat_cell::models::NewConversation;
use chat_cell::services::chat::ChatService;
use shared_config::AppConfig;
use shared_database::supabase::{ConflictError, SupabaseClient};
use shared_models::time::{minute_of_day, time_from_minutes};

use crate::models::{
    Booking, BookingError, BookingStatus, CancelBookingRequest, CreateBookingRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::lifecycle::BookingLifecycleService;

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    availability_service: AvailabilityService,
    lifecycle_service: BookingLifecycleService,
    business_service: BusinessService,
    chat_service: ChatService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            availability_service: AvailabilityService::new(Arc::clone(&supabase)),
            lifecycle_service: BookingLifecycleService::new(),
            business_service: BusinessService::new(config),
            chat_service: ChatService::new(config),
            supabase,
        }
    }

    /// Create a booking in `pending` status.
    ///
    /// The availability check here is advisory UX; the bookings table's
    /// exclusion constraint has the final word, and its 409 surfaces as
    /// [`BookingError::ConflictDetected`].
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        info!(
            "Creating booking for client {} at business {} on {} {}",
            request.client_id, request.business_id, request.date, request.start_time
        );

        if request.duration_minutes <= 0 {
            return Err(BookingError::ValidationError(format!(
                "Duration must be positive, got {}",
                request.duration_minutes
            )));
        }

        let end_minute = minute_of_day(request.start_time) + request.duration_minutes;
        let end_time = time_from_minutes(end_minute)
            .ok_or_else(|| BookingError::InvalidTime("Booking would run past midnight".to_string()))?;

        // Fail closed: a fetch error propagates instead of being read as free.
        let available = self
            .availability_service
            .check_slot_available(
                request.business_id,
                request.date,
                request.start_time,
                request.duration_minutes,
                None,
                auth_token,
            )
            .await?;

        if !available {
            return Err(BookingError::SlotNotAvailable);
        }

        let booking_data = json!({
            "business_id": request.business_id,
            "client_id": request.client_id,
            "service_id": request.service_id,
            "date": request.date,
            "start_time": request.start_time.format("%H:%M").to_string(),
            "end_time": end_time.format("%H:%M").to_string(),
            "duration_minutes": request.duration_minutes,
            "status": BookingStatus::Pending.to_string(),
            "notes": request.notes,
            "price": request.price,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/bookings",
                Some(auth_token),
                Some(booking_data),
                Some(headers),
            )
            .await
            .map_err(|e| {
                if e.downcast_ref::<ConflictError>().is_some() {
                    warn!("Write-path conflict for business {} on {}", request.business_id, request.date);
                    BookingError::ConflictDetected
                } else {
                    BookingError::DatabaseError(e.to_string())
                }
            })?;

        let Some(row) = result.into_iter().next() else {
            return Err(BookingError::DatabaseError("Failed to create booking".to_string()));
        };

        let booking: Booking = serde_json::from_value(row)
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse booking: {}", e)))?;

        info!("Booking {} created in pending status", booking.id);
        Ok(booking)
    }

    /// Get booking by ID
    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        debug!("Fetching booking: {}", booking_id);

        let path = format!("/rest/v1/bookings?id=eq.{}", booking_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(BookingError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse booking: {}", e)))
    }

    /// Confirm a pending booking.
    ///
    /// Conflicts are re-checked against the other blocking bookings
    /// immediately before the write: this is the last line of defense the
    /// client side can offer against the check-then-act race.
    pub async fn confirm_booking(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        debug!("Confirming booking: {}", booking_id);

        let booking = self.get_booking(booking_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(&booking.status, &BookingStatus::Confirmed)?;

        let still_free = self
            .availability_service
            .check_slot_available(
                booking.business_id,
                booking.date,
                booking.start_time,
                booking.duration_minutes,
                Some(booking.id),
                auth_token,
            )
            .await?;

        if !still_free {
            warn!("Booking {} lost its slot before confirmation", booking_id);
            return Err(BookingError::ConflictDetected);
        }

        let confirmed = self
            .update_booking_record(
                booking_id,
                json!({
                    "status": BookingStatus::Confirmed.to_string(),
                    "updated_at": Utc::now().to_rfc3339()
                }),
                auth_token,
            )
            .await?;

        self.open_conversation(&confirmed, auth_token).await;

        info!("Booking {} confirmed", booking_id);
        Ok(confirmed)
    }

    /// Cancel a booking with a reason and who cancelled, for the audit trail.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        request: CancelBookingRequest,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        debug!("Cancelling booking: {}", booking_id);

        let booking = self.get_booking(booking_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(&booking.status, &BookingStatus::Cancelled)?;

        let cancelled = self
            .update_booking_record(
                booking_id,
                json!({
                    "status": BookingStatus::Cancelled.to_string(),
                    "cancelled_by": request.cancelled_by,
                    "cancellation_reason": request.reason,
                    "updated_at": Utc::now().to_rfc3339()
                }),
                auth_token,
            )
            .await?;

        info!("Booking {} cancelled", booking_id);
        Ok(cancelled)
    }

    /// Mark a confirmed booking as completed.
    pub async fn complete_booking(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        self.conclude_booking(booking_id, BookingStatus::Completed, auth_token)
            .await
    }

    /// Mark a confirmed booking as a no-show.
    pub async fn mark_no_show(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        self.conclude_booking(booking_id, BookingStatus::NoShow, auth_token)
            .await
    }

    /// A client's bookings, newest first, optionally filtered by status.
    pub async fn client_bookings(
        &self,
        client_id: Uuid,
        status: Option<BookingStatus>,
        auth_token: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        debug!("Fetching bookings for client: {}", client_id);

        let mut query_parts = vec![format!("client_id=eq.{}", client_id)];
        if let Some(status) = status {
            query_parts.push(format!("status=eq.{}", status));
        }

        let path = format!(
            "/rest/v1/bookings?{}&order=date.desc,start_time.desc",
            query_parts.join("&")
        );

        self.fetch_bookings(&path, auth_token).await
    }

    /// A business's bookings in day order.
    pub async fn business_bookings(
        &self,
        business_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        debug!("Fetching bookings for business: {}", business_id);

        let path = format!(
            "/rest/v1/bookings?business_id=eq.{}&order=date.asc,start_time.asc",
            business_id
        );

        self.fetch_bookings(&path, auth_token).await
    }

    pub fn availability(&self) -> &AvailabilityService {
        &self.availability_service
    }

    // Private helper methods

    async fn conclude_booking(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        debug!("Transitioning booking {} to {}", booking_id, new_status);

        let booking = self.get_booking(booking_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(&booking.status, &new_status)?;

        self.update_booking_record(
            booking_id,
            json!({
                "status": new_status.to_string(),
                "updated_at": Utc::now().to_rfc3339()
            }),
            auth_token,
        )
        .await
    }

    async fn update_booking_record(
        &self,
        booking_id: Uuid,
        update: Value,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", booking_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(update), Some(headers))
            .await
            .map_err(|e| {
                if e.downcast_ref::<ConflictError>().is_some() {
                    BookingError::ConflictDetected
                } else {
                    BookingError::DatabaseError(e.to_string())
                }
            })?;

        let Some(row) = result.into_iter().next() else {
            return Err(BookingError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse booking: {}", e)))
    }

    async fn fetch_bookings(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Booking>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse bookings: {}", e)))
    }

    /// Open the chat thread for a confirmed booking. Best effort: a chat
    /// hiccup must not roll back the confirmation.
    async fn open_conversation(&self, booking: &Booking, auth_token: &str) {
        let business = match self
            .business_service
            .get_business(booking.business_id, auth_token)
            .await
        {
            Ok(business) => business,
            Err(e) => {
                warn!("Skipping conversation for booking {}: {}", booking.id, e);
                return;
            }
        };

        let service_booked = business
            .service(booking.service_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "Service".to_string());

        let request = NewConversation {
            booking_id: booking.id,
            client_id: booking.client_id,
            professional_id: business.owner_id,
            business_name: business.name,
            service_booked,
        };

        if let Err(e) = self.chat_service.create_conversation(request, auth_token).await {
            warn!("Failed to open conversation for booking {}: {}", booking.id, e);
        }
    }
}
