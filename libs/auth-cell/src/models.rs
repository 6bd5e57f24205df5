use serde::{Deserialize, Serialize};

/// Everything the portal shell needs on first paint: who the user is, what
/// role drives their dashboard, and the unread notification badge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalState {
    pub user_id: String,
    pub role: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub unread_notifications: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BootstrapError {
    #[error("Identity record not found")]
    IdentityNotFound,

    #[error("Identity fetch failed after retries: {0}")]
    IdentityUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
