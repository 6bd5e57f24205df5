use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Row shape of the remote `veterinarian` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Veterinarian {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: String,
    pub specialty: Option<String>,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VetSearchQuery {
    pub specialty: Option<String>,
    pub available_only: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum VetError {
    #[error("Veterinarian not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
