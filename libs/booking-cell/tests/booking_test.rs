// libs/booking-cell/tests/booking_test.rs
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::models::{BookingError, BookingStatus, CreateBookingRequest};
use booking_cell::services::booking::BookingService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const BOOKING_ID: &str = "e5d3a8b2-4c61-49e7-8f2d-6a9b0c3d4e05";
const BUSINESS_ID: &str = "7c9a1a60-0b83-4a6e-9e43-2f1f3a6a4d01";
const CLIENT_ID: &str = "c1a2b3d4-5e6f-4a8b-9c0d-1e2f3a4b5c06";
const SERVICE_ID: &str = "11111111-1111-1111-1111-111111111111";

fn create_request(start_hhmm: (u32, u32)) -> CreateBookingRequest {
    CreateBookingRequest {
        business_id: Uuid::parse_str(BUSINESS_ID).unwrap(),
        client_id: Uuid::parse_str(CLIENT_ID).unwrap(),
        service_id: Uuid::parse_str(SERVICE_ID).unwrap(),
        date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        start_time: NaiveTime::from_hms_opt(start_hhmm.0, start_hhmm.1, 0).unwrap(),
        duration_minutes: 30,
        notes: None,
        price: 25.0,
    }
}

async fn mount_day_bookings(mock_server: &MockServer, rows: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("business_id", format!("eq.{}", BUSINESS_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn create_booking_lands_in_pending_status() {
    let mock_server = MockServer::start().await;
    mount_day_bookings(&mock_server, vec![]).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(vec![
            MockSupabaseResponses::booking_response(
                BOOKING_ID,
                BUSINESS_ID,
                CLIENT_ID,
                "2026-03-02",
                "10:00",
                "10:30",
                "pending",
            ),
        ]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = BookingService::new(&config);

    let booking = service
        .create_booking(create_request((10, 0)), "token")
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.end_time, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
}

#[tokio::test]
async fn overlapping_proposal_is_rejected_before_the_write() {
    let mock_server = MockServer::start().await;
    mount_day_bookings(
        &mock_server,
        vec![MockSupabaseResponses::booking_response(
            BOOKING_ID,
            BUSINESS_ID,
            CLIENT_ID,
            "2026-03-02",
            "10:00",
            "10:30",
            "confirmed",
        )],
    )
    .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = BookingService::new(&config);

    // 10:15-10:45 overlaps the existing 10:00-10:30.
    let result = service.create_booking(create_request((10, 15)), "token").await;
    assert!(matches!(result, Err(BookingError::SlotNotAvailable)));

    // 10:30-11:00 only touches it and goes through to the write.
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(vec![
            MockSupabaseResponses::booking_response(
                "f6e5d4c3-b2a1-4098-8765-432100fedcba",
                BUSINESS_ID,
                CLIENT_ID,
                "2026-03-02",
                "10:30",
                "11:00",
                "pending",
            ),
        ]))
        .mount(&mock_server)
        .await;

    let booking = service
        .create_booking(create_request((10, 30)), "token")
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn failed_bookings_fetch_fails_closed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage down"))
        .mount(&mock_server)
        .await;

    // The insert must never be attempted on an unchecked slot.
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(Vec::<serde_json::Value>::new()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = BookingService::new(&config);

    let result = service.create_booking(create_request((10, 0)), "token").await;
    assert!(matches!(result, Err(BookingError::DatabaseError(_))));
}

#[tokio::test]
async fn storage_level_conflict_maps_to_conflict_detected() {
    let mock_server = MockServer::start().await;
    mount_day_bookings(&mock_server, vec![]).await;

    // The exclusion constraint fires at commit time even though the
    // advisory check saw a free slot.
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate slot"))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = BookingService::new(&config);

    let result = service.create_booking(create_request((10, 0)), "token").await;
    assert!(matches!(result, Err(BookingError::ConflictDetected)));
}

#[tokio::test]
async fn non_positive_duration_is_rejected_immediately() {
    let mock_server = MockServer::start().await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = BookingService::new(&config);

    let mut request = create_request((10, 0));
    request.duration_minutes = 0;

    let result = service.create_booking(request, "token").await;
    assert!(matches!(result, Err(BookingError::ValidationError(_))));
}

#[tokio::test]
async fn confirming_a_pending_booking_rechecks_then_writes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", BOOKING_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockSupabaseResponses::booking_response(
                BOOKING_ID,
                BUSINESS_ID,
                CLIENT_ID,
                "2026-03-02",
                "10:00",
                "10:30",
                "pending",
            ),
        ]))
        .mount(&mock_server)
        .await;

    // Re-check sees no other blocking booking that day.
    mount_day_bookings(&mock_server, vec![]).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockSupabaseResponses::booking_response(
                BOOKING_ID,
                BUSINESS_ID,
                CLIENT_ID,
                "2026-03-02",
                "10:00",
                "10:30",
                "confirmed",
            ),
        ]))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The conversation hook looks the business up; an empty result makes it
    // a no-op without failing the confirmation.
    Mock::given(method("GET"))
        .and(path("/rest/v1/businesses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = BookingService::new(&config);

    let confirmed = service
        .confirm_booking(Uuid::parse_str(BOOKING_ID).unwrap(), "token")
        .await
        .unwrap();

    assert_eq!(confirmed.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn confirmation_detects_a_slot_taken_in_the_meantime() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", BOOKING_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockSupabaseResponses::booking_response(
                BOOKING_ID,
                BUSINESS_ID,
                CLIENT_ID,
                "2026-03-02",
                "10:00",
                "10:30",
                "pending",
            ),
        ]))
        .mount(&mock_server)
        .await;

    // Another booking grabbed the interval between creation and confirmation.
    mount_day_bookings(
        &mock_server,
        vec![MockSupabaseResponses::booking_response(
            "f6e5d4c3-b2a1-4098-8765-432100fedcba",
            BUSINESS_ID,
            "d4c3b2a1-0f9e-4876-b543-210fedcba987",
            "2026-03-02",
            "10:15",
            "10:45",
            "confirmed",
        )],
    )
    .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = BookingService::new(&config);

    let result = service
        .confirm_booking(Uuid::parse_str(BOOKING_ID).unwrap(), "token")
        .await;

    assert!(matches!(result, Err(BookingError::ConflictDetected)));
}

#[tokio::test]
async fn concluded_bookings_cannot_be_confirmed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", BOOKING_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockSupabaseResponses::booking_response(
                BOOKING_ID,
                BUSINESS_ID,
                CLIENT_ID,
                "2026-03-02",
                "10:00",
                "10:30",
                "completed",
            ),
        ]))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = BookingService::new(&config);

    let result = service
        .confirm_booking(Uuid::parse_str(BOOKING_ID).unwrap(), "token")
        .await;

    assert!(matches!(result, Err(BookingError::InvalidStatusTransition(_))));
}
