use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentSearchQuery, AppointmentStatus, BookVisitRequest, BookingError,
    BookingRules, DaySlotsResponse, SlotQueryParams, SubmitParams,
};
use crate::services::booking::VisitBookingService;
use crate::services::slots::day_slots;

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::MissingDateTime
        | BookingError::MissingVet
        | BookingError::FutureTimeRequired
        | BookingError::LeadTimeRequired => AppError::ValidationError(e.to_string()),
        BookingError::InvalidTime(msg) => AppError::BadRequest(msg),
        BookingError::SlotTaken => AppError::Conflict(e.to_string()),
        BookingError::NotFound => AppError::NotFound(e.to_string()),
        BookingError::Unauthorized => AppError::Auth(e.to_string()),
        BookingError::InvalidStatusTransition(_)
        | BookingError::NotYetOccurred
        | BookingError::NotHistorical => AppError::BadRequest(e.to_string()),
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Candidate times for a calendar date, each flagged selectable or not.
/// With no date selected every slot comes back unselectable.
#[axum::debug_handler]
pub async fn get_day_slots(
    Query(params): Query<SlotQueryParams>,
) -> Result<Json<DaySlotsResponse>, AppError> {
    let rules = BookingRules::default();
    let slots = day_slots(params.date, Utc::now(), &rules);

    Ok(Json(DaySlotsResponse {
        date: params.date,
        slots,
    }))
}

/// Booking submission. A `reschedule` query parameter carrying an existing
/// appointment id turns the submission into an update of that record.
#[axum::debug_handler]
pub async fn submit_visit(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<SubmitParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookVisitRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = VisitBookingService::new(&state);

    let appointment = booking_service
        .submit(&user, request, params.reschedule, token)
        .await
        .map_err(map_booking_error)?;

    let message = if params.reschedule.is_some() {
        "Visit rescheduled, awaiting re-approval"
    } else {
        "Visit booked successfully"
    };

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": message
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = VisitBookingService::new(&state);

    let appointment = booking_service.get_appointment(appointment_id, token).await
        .map_err(map_booking_error)?;

    let is_owner = appointment.user_id.to_string() == user.id;
    let is_vet = appointment.vet_id.to_string() == user.id;

    if !is_owner && !is_vet && !user.is_admin() {
        return Err(AppError::Auth("Not authorized to view this appointment".to_string()));
    }

    Ok(Json(json!(appointment)))
}

/// The caller's own appointments, newest first.
#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<MyAppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = VisitBookingService::new(&state);

    let user_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user id in token".to_string()))?;

    let search = AppointmentSearchQuery {
        user_id: Some(user_id),
        vet_id: None,
        status: query.status,
        from_date: query.from_date,
        to_date: query.to_date,
        limit: query.limit.or(Some(50)),
        offset: query.offset,
    };

    let appointments = booking_service.search_appointments(search, token).await
        .map_err(map_booking_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

/// A vet's schedule: the assigned vet or an admin only.
#[axum::debug_handler]
pub async fn get_vet_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(vet_id): Path<Uuid>,
    Query(query): Query<MyAppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let is_self = user.is_vet() && vet_id.to_string() == user.id;
    if !is_self && !user.is_admin() {
        return Err(AppError::Auth("Not authorized to view this schedule".to_string()));
    }

    let booking_service = VisitBookingService::new(&state);
    let search = AppointmentSearchQuery {
        user_id: None,
        vet_id: Some(vet_id),
        status: query.status,
        from_date: query.from_date,
        to_date: query.to_date,
        limit: query.limit.or(Some(50)),
        offset: query.offset,
    };

    let appointments = booking_service.search_appointments(search, token).await
        .map_err(map_booking_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn accept_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    review(state, appointment_id, auth.token(), user, AppointmentStatus::Accepted).await
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    review(state, appointment_id, auth.token(), user, AppointmentStatus::Rejected).await
}

async fn review(
    state: Arc<AppConfig>,
    appointment_id: Uuid,
    token: &str,
    user: User,
    decision: AppointmentStatus,
) -> Result<Json<Value>, AppError> {
    let booking_service = VisitBookingService::new(&state);

    let appointment = booking_service.review(appointment_id, &user, decision, token).await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = VisitBookingService::new(&state);

    let appointment = booking_service.complete(appointment_id, &user, token).await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = VisitBookingService::new(&state);

    booking_service.delete(appointment_id, &user, token).await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment removed"
    })))
}

#[derive(Debug, serde::Deserialize)]
pub struct MyAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<chrono::DateTime<Utc>>,
    pub to_date: Option<chrono::DateTime<Utc>>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}
