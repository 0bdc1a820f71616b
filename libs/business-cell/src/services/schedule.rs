// libs/business-cell/src/services/schedule.rs
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::time::{minute_of_day, time_from_minutes};

use crate::models::{BookedInterval, Business, BusinessError, DaySchedule, DaySlotsResponse, SlotQuery, TimeSlot};

pub const DEFAULT_SLOT_MINUTES: i32 = 30;

/// Generate the bookable time slots for one day of opening hours.
///
/// Slots start at `open`, are spaced exactly `slot_minutes` apart, and a slot
/// is emitted only if it ends at or before `close`. A slot is unavailable when
/// its interval intersects the break window (half-open comparison at minute
/// granularity). When `date` is the current day, slots whose start is not
/// strictly after `now` are omitted entirely; a date in the past yields
/// nothing.
///
/// A closed day or a window shorter than one slot is a legitimate empty
/// result, not an error. The clock is passed in so the result is
/// deterministic under test.
pub fn generate_time_slots(
    day: &DaySchedule,
    date: NaiveDate,
    slot_minutes: i32,
    now: DateTime<Utc>,
) -> Result<Vec<TimeSlot>, BusinessError> {
    if slot_minutes <= 0 {
        return Err(BusinessError::InvalidSlotDuration(slot_minutes));
    }

    if !day.is_open {
        return Ok(vec![]);
    }

    let open = minute_of_day(day.open);
    let close = minute_of_day(day.close);
    if close <= open {
        return Ok(vec![]);
    }

    let today = now.date_naive();
    if date < today {
        return Ok(vec![]);
    }
    let cutoff = (date == today).then(|| minute_of_day(now.time()));

    let break_window = day
        .break_window
        .as_ref()
        .map(|b| (minute_of_day(b.start), minute_of_day(b.end)));

    let mut slots = Vec::new();
    let mut start = open;

    while start + slot_minutes <= close {
        let end = start + slot_minutes;

        // "not strictly after now" filters out the slot currently underway
        let in_the_past = cutoff.is_some_and(|now_minute| start <= now_minute);

        if !in_the_past {
            let in_break = break_window
                .is_some_and(|(break_start, break_end)| start < break_end && end > break_start);

            let time = time_from_minutes(start)
                .ok_or_else(|| BusinessError::ValidationError(format!("slot start out of range: {}", start)))?;

            slots.push(TimeSlot {
                time,
                available: !in_break,
            });
        }

        start += slot_minutes;
    }

    Ok(slots)
}

/// Mark slots that collide with already-booked intervals as unavailable.
/// Half-open comparison, so a slot starting exactly where a booking ends
/// stays available.
pub fn mark_booked_slots(slots: &mut [TimeSlot], slot_minutes: i32, booked: &[BookedInterval]) {
    for slot in slots.iter_mut() {
        let start = minute_of_day(slot.time);
        let end = start + slot_minutes;

        let collides = booked.iter().any(|b| {
            let booked_start = minute_of_day(b.start_time);
            let booked_end = minute_of_day(b.end_time);
            start < booked_end && end > booked_start
        });

        if collides {
            slot.available = false;
        }
    }
}

pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Calculate the bookable slots for a business on a specific date.
    ///
    /// Combines the business's weekly schedule with the day's existing
    /// bookings: slots inside the break window or colliding with a blocking
    /// booking are surfaced as unavailable so the client can grey them out.
    pub async fn day_slots(
        &self,
        business_id: Uuid,
        query: &SlotQuery,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<DaySlotsResponse, BusinessError> {
        debug!("Calculating slots for business {} on {}", business_id, query.date);

        let business = self.get_business(business_id, auth_token).await?;

        let slot_minutes = self.resolve_slot_duration(&business, query)?;
        let day = business.schedule.for_weekday(query.date.weekday());

        let mut slots = generate_time_slots(day, query.date, slot_minutes, now)?;

        if !slots.is_empty() {
            let booked = self.get_booked_intervals(business_id, query.date, auth_token).await?;
            mark_booked_slots(&mut slots, slot_minutes, &booked);
        }

        debug!("Generated {} slots for business {}", slots.len(), business_id);

        Ok(DaySlotsResponse {
            business_id,
            date: query.date,
            slot_duration_minutes: slot_minutes,
            slots,
        })
    }

    async fn get_business(
        &self,
        business_id: Uuid,
        auth_token: &str,
    ) -> Result<Business, BusinessError> {
        let path = format!("/rest/v1/businesses?id=eq.{}", business_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BusinessError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(BusinessError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| BusinessError::DatabaseError(format!("Failed to parse business: {}", e)))
    }

    fn resolve_slot_duration(
        &self,
        business: &Business,
        query: &SlotQuery,
    ) -> Result<i32, BusinessError> {
        if let Some(requested) = query.slot_duration {
            return Ok(requested);
        }

        if let Some(service_id) = query.service_id {
            let service = business
                .service(service_id)
                .ok_or_else(|| BusinessError::ValidationError(format!("Unknown service: {}", service_id)))?;
            return Ok(service.duration_minutes);
        }

        Ok(DEFAULT_SLOT_MINUTES)
    }

    /// Intervals already taken on that day. Pending bookings block too: they
    /// express intent and must not be double-sold while awaiting confirmation.
    async fn get_booked_intervals(
        &self,
        business_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<BookedInterval>, BusinessError> {
        let path = format!(
            "/rest/v1/bookings?business_id=eq.{}&date=eq.{}&status=in.(pending,confirmed)&order=start_time.asc",
            business_id, date
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BusinessError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<BookedInterval>, _>>()
            .map_err(|e| BusinessError::DatabaseError(format!("Failed to parse bookings: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BreakWindow;
    use chrono::{NaiveTime, TimeZone};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(open: NaiveTime, close: NaiveTime) -> DaySchedule {
        DaySchedule {
            open,
            close,
            is_open: true,
            break_window: None,
        }
    }

    fn rendered(slots: &[TimeSlot]) -> Vec<String> {
        slots.iter().map(|s| s.time.format("%H:%M").to_string()).collect()
    }

    // A clock far from any test date, so same-day filtering stays inert.
    fn distant_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn future_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn one_hour_window_with_half_hour_slots() {
        let slots =
            generate_time_slots(&day(t(9, 0), t(10, 0)), future_date(), 30, distant_now()).unwrap();
        assert_eq!(rendered(&slots), vec!["09:00", "09:30"]);
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn every_slot_ends_at_or_before_close() {
        for (open, close, duration) in [
            (t(9, 0), t(17, 0), 30),
            (t(8, 30), t(12, 10), 25),
            (t(9, 45), t(11, 0), 45),
            (t(0, 0), t(23, 45), 90),
        ] {
            let slots =
                generate_time_slots(&day(open, close), future_date(), duration, distant_now())
                    .unwrap();
            for slot in &slots {
                assert!(
                    minute_of_day(slot.time) + duration <= minute_of_day(close),
                    "slot {} overruns close {}",
                    slot.time,
                    close
                );
            }
        }
    }

    #[test]
    fn consecutive_slots_are_spaced_by_exactly_one_duration() {
        let slots =
            generate_time_slots(&day(t(9, 0), t(17, 0)), future_date(), 45, distant_now()).unwrap();
        assert!(!slots.is_empty());
        for pair in slots.windows(2) {
            assert_eq!(minute_of_day(pair[1].time) - minute_of_day(pair[0].time), 45);
        }
    }

    #[test]
    fn minute_arithmetic_carries_across_the_hour() {
        let slots =
            generate_time_slots(&day(t(9, 45), t(11, 0)), future_date(), 30, distant_now()).unwrap();
        assert_eq!(rendered(&slots), vec!["09:45", "10:15"]);
    }

    #[test]
    fn break_window_marks_covered_slots_unavailable() {
        let mut schedule = day(t(9, 0), t(17, 0));
        schedule.break_window = Some(BreakWindow {
            start: t(12, 0),
            end: t(13, 0),
        });

        let slots = generate_time_slots(&schedule, future_date(), 30, distant_now()).unwrap();

        for slot in &slots {
            let start = minute_of_day(slot.time);
            let expected_available = !(start >= 12 * 60 && start < 13 * 60);
            assert_eq!(
                slot.available, expected_available,
                "slot {} availability mismatch",
                slot.time
            );
        }
        // The slot ending exactly at break start stays available.
        assert!(slots.iter().any(|s| s.time == t(11, 30) && s.available));
    }

    #[test]
    fn misaligned_break_blocks_any_intersecting_slot() {
        let mut schedule = day(t(9, 0), t(17, 0));
        schedule.break_window = Some(BreakWindow {
            start: t(12, 15),
            end: t(12, 45),
        });

        let slots = generate_time_slots(&schedule, future_date(), 30, distant_now()).unwrap();

        // 12:00-12:30 and 12:30-13:00 both intersect [12:15, 12:45).
        let by_time = |time| slots.iter().find(|s| s.time == time).unwrap();
        assert!(!by_time(t(12, 0)).available);
        assert!(!by_time(t(12, 30)).available);
        assert!(by_time(t(11, 30)).available);
        assert!(by_time(t(13, 0)).available);
    }

    #[test]
    fn same_day_slots_already_started_are_omitted() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 14, 5, 0).unwrap();
        let slots =
            generate_time_slots(&day(t(9, 0), t(17, 0)), now.date_naive(), 30, now).unwrap();

        let times = rendered(&slots);
        assert!(!times.contains(&"14:00".to_string()));
        assert_eq!(times.first().map(String::as_str), Some("14:30"));
        assert!(slots.iter().all(|s| minute_of_day(s.time) > 14 * 60 + 5));
    }

    #[test]
    fn future_date_is_not_filtered_by_the_clock() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 14, 5, 0).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let slots = generate_time_slots(&day(t(9, 0), t(17, 0)), tomorrow, 30, now).unwrap();
        assert_eq!(rendered(&slots).first().map(String::as_str), Some("09:00"));
    }

    #[test]
    fn past_date_yields_no_slots() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 14, 5, 0).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let slots = generate_time_slots(&day(t(9, 0), t(17, 0)), yesterday, 30, now).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn closed_or_degenerate_windows_yield_empty() {
        // open == close
        let slots =
            generate_time_slots(&day(t(9, 0), t(9, 0)), future_date(), 30, distant_now()).unwrap();
        assert!(slots.is_empty());

        // window shorter than one slot
        let slots =
            generate_time_slots(&day(t(9, 0), t(9, 20)), future_date(), 30, distant_now()).unwrap();
        assert!(slots.is_empty());

        // day flagged closed
        let mut schedule = day(t(9, 0), t(17, 0));
        schedule.is_open = false;
        let slots = generate_time_slots(&schedule, future_date(), 30, distant_now()).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let result = generate_time_slots(&day(t(9, 0), t(17, 0)), future_date(), 0, distant_now());
        assert!(matches!(result, Err(BusinessError::InvalidSlotDuration(0))));

        let result = generate_time_slots(&day(t(9, 0), t(17, 0)), future_date(), -15, distant_now());
        assert!(matches!(result, Err(BusinessError::InvalidSlotDuration(-15))));
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 11, 42, 0).unwrap();
        let mut schedule = day(t(9, 0), t(18, 0));
        schedule.break_window = Some(BreakWindow {
            start: t(13, 0),
            end: t(14, 0),
        });

        let first = generate_time_slots(&schedule, now.date_naive(), 30, now).unwrap();
        let second = generate_time_slots(&schedule, now.date_naive(), 30, now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn booked_intervals_grey_out_colliding_slots_only() {
        let mut slots =
            generate_time_slots(&day(t(9, 0), t(12, 0)), future_date(), 30, distant_now()).unwrap();

        let booked = vec![BookedInterval {
            start_time: t(10, 0),
            end_time: t(10, 30),
        }];
        mark_booked_slots(&mut slots, 30, &booked);

        let by_time = |time| slots.iter().find(|s| s.time == time).unwrap();
        assert!(!by_time(t(10, 0)).available);
        // Touching endpoints do not collide.
        assert!(by_time(t(9, 30)).available);
        assert!(by_time(t(10, 30)).available);
    }
}
