use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    Appointment, AppointmentSearchQuery, AppointmentStatus, BookVisitRequest,
    BookingError, BookingRules,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::slots::parse_slot_time;

pub struct VisitBookingService {
    supabase: SupabaseClient,
    lifecycle: AppointmentLifecycleService,
    rules: BookingRules,
}

impl VisitBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            lifecycle: AppointmentLifecycleService::new(),
            rules: BookingRules::default(),
        }
    }

    /// Validate and commit a visit submission.
    ///
    /// Preconditions run in a fixed order and each failure carries its own
    /// message with no remote write having happened: date+time selected,
    /// vet selected, combined instant strictly in the future, then the
    /// one-hour lead rule. With a reschedule context the existing record is
    /// updated and forced back to `pending`; otherwise a new record is
    /// inserted.
    pub async fn submit(
        &self,
        user: &User,
        request: BookVisitRequest,
        reschedule_of: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let (vet_id, scheduled_at) = self.validate_submission(&request, Utc::now())?;

        self.check_slot_taken(vet_id, scheduled_at, reschedule_of, auth_token).await?;

        match reschedule_of {
            Some(appointment_id) => {
                self.reschedule_record(appointment_id, user, scheduled_at, auth_token).await
            }
            None => {
                self.create_record(user, vet_id, scheduled_at, request.notes, auth_token).await
            }
        }
    }

    /// Owner marks a visit completed once its scheduled time has passed.
    pub async fn complete(
        &self,
        appointment_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.user_id.to_string() != user.id && !user.is_admin() {
            return Err(BookingError::Unauthorized);
        }

        if appointment.scheduled_at > Utc::now() {
            return Err(BookingError::NotYetOccurred);
        }

        self.lifecycle.validate_status_transition(appointment.status, AppointmentStatus::Completed)?;

        self.set_status(appointment_id, AppointmentStatus::Completed, auth_token).await
    }

    /// Vet (or admin) review of a pending visit.
    pub async fn review(
        &self,
        appointment_id: Uuid,
        user: &User,
        decision: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug_assert!(matches!(decision, AppointmentStatus::Accepted | AppointmentStatus::Rejected));

        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        let is_assigned_vet = user.is_vet() && appointment.vet_id.to_string() == user.id;
        if !is_assigned_vet && !user.is_admin() {
            return Err(BookingError::Unauthorized);
        }

        self.lifecycle.validate_status_transition(appointment.status, decision)?;

        self.set_status(appointment_id, decision, auth_token).await
    }

    /// Remove a historical record at the owner's request. Upcoming visits
    /// cannot be deleted this way.
    pub async fn delete(
        &self,
        appointment_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.user_id.to_string() != user.id && !user.is_admin() {
            return Err(BookingError::Unauthorized);
        }

        if !appointment.is_historical(Utc::now()) {
            return Err(BookingError::NotHistorical);
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        debug!("Searching appointments with filters: {:?}", query);

        let mut query_parts = Vec::new();

        if let Some(user_id) = query.user_id {
            query_parts.push(format!("user_id=eq.{}", user_id));
        }
        if let Some(vet_id) = query.vet_id {
            query_parts.push(format!("vet_id=eq.{}", vet_id));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(from_date) = query.from_date {
            // URL-encoded RFC3339 so PostgREST parses the timestamp filter
            let date_str = from_date.to_rfc3339();
            query_parts.push(format!("scheduled_at=gte.{}", urlencoding::encode(&date_str)));
        }
        if let Some(to_date) = query.to_date {
            let date_str = to_date.to_rfc3339();
            query_parts.push(format!("scheduled_at=lte.{}", urlencoding::encode(&date_str)));
        }

        let mut path = format!(
            "/rest/v1/appointments?{}&order=scheduled_at.desc",
            query_parts.join("&")
        );

        if let Some(limit) = query.limit {
            path.push_str(&format!("&limit={}", limit));
        }
        if let Some(offset) = query.offset {
            path.push_str(&format!("&offset={}", offset));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Appointment>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    // ==============================================================================
    // PRIVATE HELPERS
    // ==============================================================================

    /// Ordered precondition checks. Pure: touches nothing remote.
    fn validate_submission(
        &self,
        request: &BookVisitRequest,
        now: DateTime<Utc>,
    ) -> Result<(Uuid, DateTime<Utc>), BookingError> {
        let (date, time_str) = match (request.visit_date, request.visit_time.as_deref()) {
            (Some(d), Some(t)) if !t.is_empty() => (d, t),
            _ => return Err(BookingError::MissingDateTime),
        };

        let vet_id = request.vet_id.ok_or(BookingError::MissingVet)?;

        let time = parse_slot_time(time_str)
            .ok_or_else(|| BookingError::InvalidTime(format!("'{}' is not a valid time", time_str)))?;

        let scheduled_at = date.and_time(time).and_utc();

        if scheduled_at <= now {
            return Err(BookingError::FutureTimeRequired);
        }

        if scheduled_at <= now + Duration::minutes(self.rules.min_lead_minutes) {
            return Err(BookingError::LeadTimeRequired);
        }

        Ok((vet_id, scheduled_at))
    }

    /// Vet-level uniqueness: another live booking at the identical time
    /// blocks the submission. The record being rescheduled is excluded.
    async fn check_slot_taken(
        &self,
        vet_id: Uuid,
        scheduled_at: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let date_str = scheduled_at.to_rfc3339();
        let mut path = format!(
            "/rest/v1/appointments?vet_id=eq.{}&scheduled_at=eq.{}&status=in.(pending,accepted)",
            vet_id,
            urlencoding::encode(&date_str)
        );
        if let Some(id) = exclude_appointment_id {
            path.push_str(&format!("&id=neq.{}", id));
        }

        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            warn!("Slot conflict for vet {} at {}", vet_id, scheduled_at);
            return Err(BookingError::SlotTaken);
        }

        Ok(())
    }

    async fn create_record(
        &self,
        user: &User,
        vet_id: Uuid,
        scheduled_at: DateTime<Utc>,
        notes: Option<String>,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let now = Utc::now();
        let appointment_data = json!({
            "user_id": user.id,
            "vet_id": vet_id,
            "scheduled_at": scheduled_at.to_rfc3339(),
            "status": AppointmentStatus::Pending.to_string(),
            "notes": notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(headers),
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::DatabaseError("Failed to create appointment".to_string()));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse created appointment: {}", e)))?;

        info!("Appointment {} booked with vet {} at {}", appointment.id, vet_id, scheduled_at);
        Ok(appointment)
    }

    /// Reschedule path: updates scheduled_at on the carried record and
    /// forces the status back to pending for re-approval. Never inserts.
    async fn reschedule_record(
        &self,
        appointment_id: Uuid,
        user: &User,
        scheduled_at: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;

        if current.user_id.to_string() != user.id && !user.is_admin() {
            return Err(BookingError::Unauthorized);
        }

        self.lifecycle.validate_status_transition(current.status, AppointmentStatus::Pending)?;

        let update_data = json!({
            "scheduled_at": scheduled_at.to_rfc3339(),
            "status": AppointmentStatus::Pending.to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let appointment = self.patch_record(appointment_id, update_data, auth_token).await?;

        info!("Appointment {} rescheduled to {}, awaiting re-approval", appointment_id, scheduled_at);
        Ok(appointment)
    }

    async fn set_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let update_data = json!({
            "status": status.to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let appointment = self.patch_record(appointment_id, update_data, auth_token).await?;

        info!("Appointment {} moved to {}", appointment_id, status);
        Ok(appointment)
    }

    async fn patch_record(
        &self,
        appointment_id: Uuid,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::DatabaseError("Failed to update appointment".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse updated appointment: {}", e)))
    }
}
