use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};
use std::fmt;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vet_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Historical records are the only ones a user may delete: the visit
    /// time has passed, or the record reached a terminal status.
    pub fn is_historical(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at < now || self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Rejected | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Accepted => write!(f, "accepted"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Booking form payload. Date, time and vet are all optional at the wire
/// level so the service can reject each missing field with its own message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookVisitRequest {
    pub vet_id: Option<Uuid>,
    pub visit_date: Option<NaiveDate>,
    /// Candidate time as "HH:MM", one of the fixed slot roster entries.
    pub visit_time: Option<String>,
    pub notes: Option<String>,
}

/// Reschedule context: an existing appointment id carried via the
/// `reschedule` query parameter turns a submission into an update.
#[derive(Debug, Deserialize)]
pub struct SubmitParams {
    pub reschedule: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQueryParams {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    pub time: String,
    pub selectable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySlotsResponse {
    pub date: Option<NaiveDate>,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub user_id: Option<Uuid>,
    pub vet_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BookingError {
    #[error("Please select a date and time for the visit")]
    MissingDateTime,

    #[error("Please select a veterinarian")]
    MissingVet,

    #[error("Invalid visit time: {0}")]
    InvalidTime(String),

    #[error("Please select a future time")]
    FutureTimeRequired,

    #[error("Visits must be booked at least one hour in advance")]
    LeadTimeRequired,

    #[error("The veterinarian already has a visit booked at this time")]
    SlotTaken,

    #[error("Appointment not found")]
    NotFound,

    #[error("Not authorized to modify this appointment")]
    Unauthorized,

    #[error("Appointment cannot change from {0} status")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("The visit has not taken place yet")]
    NotYetOccurred,

    #[error("Only past or closed appointments can be removed")]
    NotHistorical,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

// ==============================================================================
// VALIDATION RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingRules {
    /// Minimum lead time between submission and the visit itself.
    pub min_lead_minutes: i64,
    /// First and last bookable hour of the fixed daily roster.
    pub first_slot_hour: u32,
    pub last_slot_hour: u32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            min_lead_minutes: 60,
            first_slot_hour: 9,
            last_slot_hour: 17,
        }
    }
}
