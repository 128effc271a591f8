//! QR attendance workflow: generate, scan, validate and submit

mod helpers;

use std::time::Duration;

use assert_matches::assert_matches;
use campus_events::services::attendance::{NOT_REGISTERED, SELECT_EVENT_FIRST};
use campus_events::services::qr::{self, Frame, PayloadValidator, QrPayload};
use campus_events::services::{CheckInDesk, CheckInMode, CheckInOutcome, Participation};
use campus_events::state::{ScanSession, ScanState};
use campus_events::CampusError;
use helpers::*;
use serde_json::json;
use serial_test::serial;
use tokio::time::Instant;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn registered_for(event_ids: &[i64]) -> Participation {
    Participation {
        registered_event_ids: event_ids.to_vec(),
        ..Default::default()
    }
}

#[tokio::test]
#[serial]
async fn test_generated_png_scans_back_to_event() {
    let ctx = SimpleTestContext::new().unwrap();
    let file = ctx.temp_path().join("event-42.png");

    let payload = QrPayload::new(42);
    let format = qr::save_qr(&payload, &file).unwrap();
    assert_eq!(format, qr::QrFormat::Png);

    let text = qr::decode_image_file(&file).unwrap();
    let parsed = PayloadValidator::default()
        .validate(&text, chrono::Utc::now())
        .unwrap();
    assert_eq!(parsed, payload);
}

#[tokio::test(start_paused = true)]
async fn test_scan_session_debounces_after_attempt() {
    init_test_env();
    let code = QrPayload::new(42).to_qr().unwrap();
    let frame = Frame::from_image(&qr::render_luma(&code, 4));

    let mut session = ScanSession::new(Duration::from_millis(1200), PayloadValidator::default());
    session.start();
    assert_eq!(session.state(), &ScanState::CameraActive);

    let start = Instant::now();
    let first = session.offer_frame(&frame, start).unwrap().unwrap();
    assert_eq!(first.event_id, 42);
    assert_matches!(session.state(), ScanState::Decoded(_));

    // Still paused: the same frame is ignored
    assert!(session.offer_frame(&frame, start + Duration::from_millis(600)).is_none());

    tokio::time::advance(Duration::from_millis(1200)).await;
    assert_eq!(session.poll(Instant::now()), &ScanState::Idle);
}

#[tokio::test]
#[serial]
async fn test_invalid_text_is_reported_not_submitted() {
    init_test_env();
    let mut session = ScanSession::new(Duration::from_millis(1200), PayloadValidator::default());
    session.start();

    let result = session.offer_text("hello world", Instant::now()).unwrap();
    let err = result.unwrap_err();
    assert_matches!(err, CampusError::InvalidPayload(_));
    assert!(err.user_message().starts_with("Invalid QR code format"));
    assert_matches!(session.state(), ScanState::DecodeError(_));
}

#[tokio::test]
#[serial]
async fn test_self_service_without_registration_skips_backend() {
    init_test_env();
    let server = CampusMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/attendance/qr/student"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server.server)
        .await;

    let mut desk = CheckInDesk::new(server.client(storage_with_token("student-token").await));
    let err = desk
        .submit(CheckInMode::SelfService, &QrPayload::new(42), &registered_for(&[7]))
        .await
        .unwrap_err();

    assert_matches!(err, CampusError::Validation(ref msg) if msg == NOT_REGISTERED);
    assert!(server.received().await.is_empty());
}

#[tokio::test]
#[serial]
async fn test_self_service_check_in() {
    init_test_env();
    let server = CampusMockServer::new().await;
    server
        .mock_student_qr(&create_qr_result(true, "Attendance marked successfully"))
        .await;

    let mut desk = CheckInDesk::new(server.client(storage_with_token("student-token").await));
    let outcome = desk
        .submit(CheckInMode::SelfService, &QrPayload::new(42), &registered_for(&[42]))
        .await
        .unwrap();

    assert!(outcome.is_marked());
    assert!(desk.records().is_empty());
}

#[tokio::test]
#[serial]
async fn test_backend_already_marked_is_informational() {
    init_test_env();
    let server = CampusMockServer::new().await;
    server
        .mock_student_qr(&create_qr_result(false, "Attendance already marked"))
        .await;

    let mut desk = CheckInDesk::new(server.client(storage_with_token("student-token").await));
    let outcome = desk
        .submit(CheckInMode::SelfService, &QrPayload::new(42), &registered_for(&[42]))
        .await
        .unwrap();

    assert_eq!(outcome, CheckInOutcome::AlreadyMarked("Attendance already marked".to_string()));
}

#[tokio::test]
#[serial]
async fn test_duplicate_rejection_is_informational() {
    init_test_env();
    let server = CampusMockServer::new().await;
    server
        .mock_error(
            "POST",
            "/attendance/qr/student",
            400,
            "Already marked attendance for this event",
        )
        .await;

    let mut desk = CheckInDesk::new(server.client(storage_with_token("student-token").await));
    let outcome = desk
        .submit(CheckInMode::SelfService, &QrPayload::new(42), &registered_for(&[42]))
        .await
        .unwrap();
    assert!(!outcome.is_marked());
}

#[tokio::test]
#[serial]
async fn test_admin_requires_selected_event() {
    init_test_env();
    let server = CampusMockServer::new().await;
    let mut desk = CheckInDesk::new(server.client(storage_with_token("admin-token").await));

    let err = desk
        .submit(
            CheckInMode::Admin { selected_event: None },
            &QrPayload::new(42),
            &Participation::default(),
        )
        .await
        .unwrap_err();
    assert_matches!(err, CampusError::Validation(ref msg) if msg == SELECT_EVENT_FIRST);
    assert!(server.received().await.is_empty());
}

#[tokio::test]
#[serial]
async fn test_admin_posts_scanned_payload_and_logs_record() {
    init_test_env();
    let server = CampusMockServer::new().await;
    let payload = QrPayload::issued_at(42, chrono::Utc::now());
    let qr_data = payload.encode().unwrap();

    Mock::given(method("POST"))
        .and(path("/attendance/qr"))
        .and(body_json(json!({ "event_id": 42, "qr_data": qr_data })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(create_qr_result(
            true,
            "Attendance marked successfully"
        ))))
        .expect(2)
        .mount(&server.server)
        .await;

    let mut desk = CheckInDesk::new(server.client(storage_with_token("admin-token").await));
    let mode = CheckInMode::Admin { selected_event: Some(42) };
    desk.submit(mode, &payload, &Participation::default()).await.unwrap();
    desk.submit(mode, &payload, &Participation::default()).await.unwrap();

    let records = desk.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].student_name, "Test User 100");
    assert_eq!(records[0].event_title, "Rust Workshop");
    assert!(records[0].checked_in_at >= records[1].checked_in_at);
}

#[tokio::test]
#[serial]
async fn test_admin_record_defaults_for_missing_names() {
    init_test_env();
    let server = CampusMockServer::new().await;
    server
        .mock_admin_qr(&campus_events::models::QrAttendanceResult {
            success: true,
            message: "Attendance marked successfully".to_string(),
            attendance_id: Some(9),
            student_name: None,
            event_title: None,
        })
        .await;

    let mut desk = CheckInDesk::new(server.client(storage_with_token("admin-token").await));
    desk.submit(
        CheckInMode::Admin { selected_event: Some(42) },
        &QrPayload::bare(42),
        &Participation::default(),
    )
    .await
    .unwrap();

    assert_eq!(desk.records()[0].student_name, "Unknown Student");
    assert_eq!(desk.records()[0].event_title, "Unknown Event");
}

#[tokio::test]
#[serial]
async fn test_context_scanner_uses_configured_debounce() {
    init_test_env();
    let server = CampusMockServer::new().await;
    let context = server.context(campus_events::StateStorage::in_memory());
    assert_eq!(context.scan_session().debounce(), Duration::from_millis(1200));
}
