// libs/business-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::time::hh_mm;

// ==============================================================================
// SCHEDULE MODELS
// ==============================================================================

/// Sub-interval of the open hours during which no slot is bookable
/// (lunch break and the like). Lies within `[open, close)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakWindow {
    #[serde(with = "hh_mm")]
    pub start: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end: NaiveTime,
}

/// Opening hours for a single weekday. `open < close` whenever `is_open`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(with = "hh_mm")]
    pub open: NaiveTime,
    #[serde(with = "hh_mm")]
    pub close: NaiveTime,
    pub is_open: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_window: Option<BreakWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl WeekSchedule {
    pub fn for_weekday(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

/// A candidate appointment start time. Generated per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub available: bool,
}

// ==============================================================================
// BUSINESS MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price: f64,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub city: String,
    pub services: Vec<ServiceOffering>,
    pub schedule: WeekSchedule,
    pub rating: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Business {
    pub fn service(&self, service_id: Uuid) -> Option<&ServiceOffering> {
        self.services.iter().find(|s| s.id == service_id)
    }
}

/// Booked interval on a business's day, as read back from the bookings table.
/// Only the fields the slot calculation needs.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedInterval {
    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end_time: NaiveTime,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessSearchQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub service_id: Option<Uuid>,
    pub slot_duration: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySlotsResponse {
    pub business_id: Uuid,
    pub date: NaiveDate,
    pub slot_duration_minutes: i32,
    pub slots: Vec<TimeSlot>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BusinessError {
    #[error("Business not found")]
    NotFound,

    #[error("Invalid slot duration: {0}")]
    InvalidSlotDuration(i32),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
