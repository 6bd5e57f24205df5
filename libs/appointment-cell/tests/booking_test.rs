use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{body_partial_json, method, path, query_param};

use appointment_cell::models::{AppointmentStatus, BookVisitRequest, BookingError};
use appointment_cell::services::booking::VisitBookingService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

const TOKEN: &str = "test-token";

fn service_for(server: &MockServer) -> VisitBookingService {
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    VisitBookingService::new(&config)
}

fn valid_request(vet_id: Uuid) -> BookVisitRequest {
    let scheduled = Utc::now() + Duration::days(3);
    BookVisitRequest {
        vet_id: Some(vet_id),
        visit_date: Some(scheduled.date_naive()),
        visit_time: Some("10:00".to_string()),
        notes: None,
    }
}

/// Every write endpoint is pinned to zero expected calls; the server panics
/// on drop if a validation failure leaked a remote write.
async fn mount_write_guards(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn missing_date_and_time_rejects_before_any_remote_call() {
    let server = MockServer::start().await;
    mount_write_guards(&server).await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    let request = BookVisitRequest {
        vet_id: Some(Uuid::new_v4()),
        visit_date: None,
        visit_time: None,
        notes: None,
    };

    let result = service.submit(&user, request, None, TOKEN).await;
    assert_matches!(result, Err(BookingError::MissingDateTime));

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn date_without_time_still_counts_as_missing() {
    let server = MockServer::start().await;
    mount_write_guards(&server).await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    let request = BookVisitRequest {
        vet_id: Some(Uuid::new_v4()),
        visit_date: Some((Utc::now() + Duration::days(3)).date_naive()),
        visit_time: None,
        notes: None,
    };

    assert_matches!(
        service.submit(&user, request, None, TOKEN).await,
        Err(BookingError::MissingDateTime)
    );
}

#[tokio::test]
async fn missing_vet_rejects_with_its_own_message() {
    let server = MockServer::start().await;
    mount_write_guards(&server).await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    let mut request = valid_request(Uuid::new_v4());
    request.vet_id = None;

    let result = service.submit(&user, request, None, TOKEN).await;
    assert_matches!(result, Err(BookingError::MissingVet));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn past_time_rejects_even_when_all_fields_are_present() {
    let server = MockServer::start().await;
    mount_write_guards(&server).await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    let request = BookVisitRequest {
        vet_id: Some(Uuid::new_v4()),
        visit_date: Some((Utc::now() - Duration::days(1)).date_naive()),
        visit_time: Some("10:00".to_string()),
        notes: None,
    };

    let result = service.submit(&user, request, None, TOKEN).await;
    assert_matches!(result, Err(BookingError::FutureTimeRequired));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn submission_inside_the_lead_buffer_rejects() {
    let server = MockServer::start().await;
    mount_write_guards(&server).await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    // Thirty minutes out: future, but inside the one-hour lead window
    let soon = Utc::now() + Duration::minutes(30);
    let request = BookVisitRequest {
        vet_id: Some(Uuid::new_v4()),
        visit_date: Some(soon.date_naive()),
        visit_time: Some(soon.format("%H:%M").to_string()),
        notes: None,
    };

    assert_matches!(
        service.submit(&user, request, None, TOKEN).await,
        Err(BookingError::LeadTimeRequired)
    );
}

#[tokio::test]
async fn fresh_submission_inserts_a_pending_record() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let vet_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();
    let request = valid_request(vet_id);
    let scheduled_at = request.visit_date.unwrap()
        .and_hms_opt(10, 0, 0).unwrap()
        .and_utc();

    // Conflict probe finds nothing booked at that instant
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("vet_id", format!("eq.{}", vet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({ "status": "pending" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &vet_id.to_string(),
                &scheduled_at.to_rfc3339(),
                "pending",
            )
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let appointment = service.submit(&user.to_user(), request, None, TOKEN).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.vet_id, vet_id);
    assert_eq!(appointment.scheduled_at, scheduled_at);
}

#[tokio::test]
async fn reschedule_updates_the_carried_record_and_forces_pending() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let vet_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();
    let request = valid_request(vet_id);
    let new_scheduled_at = request.visit_date.unwrap()
        .and_hms_opt(10, 0, 0).unwrap()
        .and_utc();
    let old_scheduled_at = Utc::now() + Duration::days(1);

    // Conflict probe for the new time, excluding the record being moved
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("vet_id", format!("eq.{}", vet_id)))
        .and(query_param("id", format!("neq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // Current record lookup: an accepted visit owned by the caller
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &vet_id.to_string(),
                &old_scheduled_at.to_rfc3339(),
                "accepted",
            )
        ])))
        .mount(&server)
        .await;

    // The write must be an update forcing status back to pending...
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(body_partial_json(json!({ "status": "pending" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &vet_id.to_string(),
                &new_scheduled_at.to_rfc3339(),
                "pending",
            )
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // ...never an insert
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let appointment = service
        .submit(&user.to_user(), request, Some(appointment_id), TOKEN)
        .await
        .unwrap();

    assert_eq!(appointment.id, appointment_id);
    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.scheduled_at, new_scheduled_at);
}

#[tokio::test]
async fn reschedule_of_someone_elses_appointment_is_rejected() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let other_owner = Uuid::new_v4();
    let vet_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();
    let request = valid_request(vet_id);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("vet_id", format!("eq.{}", vet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &other_owner.to_string(),
                &vet_id.to_string(),
                &(Utc::now() + Duration::days(1)).to_rfc3339(),
                "pending",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_matches!(
        service.submit(&user.to_user(), request, Some(appointment_id), TOKEN).await,
        Err(BookingError::Unauthorized)
    );
}

#[tokio::test]
async fn occupied_slot_blocks_the_submission() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let vet_id = Uuid::new_v4();
    let request = valid_request(vet_id);
    let scheduled_at = request.visit_date.unwrap()
        .and_hms_opt(10, 0, 0).unwrap()
        .and_utc();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("vet_id", format!("eq.{}", vet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &vet_id.to_string(),
                &scheduled_at.to_rfc3339(),
                "accepted",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_matches!(
        service.submit(&user.to_user(), request, None, TOKEN).await,
        Err(BookingError::SlotTaken)
    );
}

#[tokio::test]
async fn completing_a_future_visit_is_rejected() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &Uuid::new_v4().to_string(),
                &(Utc::now() + Duration::days(2)).to_rfc3339(),
                "accepted",
            )
        ])))
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_matches!(
        service.complete(appointment_id, &user.to_user(), TOKEN).await,
        Err(BookingError::NotYetOccurred)
    );
}

#[tokio::test]
async fn owner_completes_an_elapsed_accepted_visit() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let appointment_id = Uuid::new_v4();
    let vet_id = Uuid::new_v4();
    let past = Utc::now() - Duration::hours(3);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &vet_id.to_string(),
                &past.to_rfc3339(),
                "accepted",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(body_partial_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &vet_id.to_string(),
                &past.to_rfc3339(),
                "completed",
            )
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let appointment = service.complete(appointment_id, &user.to_user(), TOKEN).await.unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn upcoming_appointment_cannot_be_deleted() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &Uuid::new_v4().to_string(),
                &(Utc::now() + Duration::days(1)).to_rfc3339(),
                "pending",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_matches!(
        service.delete(appointment_id, &user.to_user(), TOKEN).await,
        Err(BookingError::NotHistorical)
    );
}

#[tokio::test]
async fn rejected_history_can_be_deleted_by_its_owner() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &Uuid::new_v4().to_string(),
                &(Utc::now() + Duration::days(1)).to_rfc3339(),
                "rejected",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert!(service.delete(appointment_id, &user.to_user(), TOKEN).await.is_ok());
}

#[tokio::test]
async fn vet_accepts_a_pending_visit() {
    let server = MockServer::start().await;

    let vet = TestUser::vet("vet@example.com");
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &Uuid::new_v4().to_string(),
                &vet.id,
                &(Utc::now() + Duration::days(1)).to_rfc3339(),
                "pending",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({ "status": "accepted" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &Uuid::new_v4().to_string(),
                &vet.id,
                &(Utc::now() + Duration::days(1)).to_rfc3339(),
                "accepted",
            )
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let appointment = service
        .review(appointment_id, &vet.to_user(), AppointmentStatus::Accepted, TOKEN)
        .await
        .unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Accepted);
}

#[tokio::test]
async fn completed_visit_cannot_be_rescheduled() {
    let server = MockServer::start().await;

    let user = TestUser::owner("owner@example.com");
    let vet_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();
    let request = valid_request(vet_id);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("vet_id", format!("eq.{}", vet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &vet_id.to_string(),
                &(Utc::now() - Duration::days(30)).to_rfc3339(),
                "completed",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_matches!(
        service.submit(&user.to_user(), request, Some(appointment_id), TOKEN).await,
        Err(BookingError::InvalidStatusTransition(AppointmentStatus::Completed))
    );
}
