use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

// ==============================================================================
// FEED ROW MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub author_id: Uuid,
    pub pet_id: Option<Uuid>,
    pub body: String,
    pub media_key: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityComment {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub client_tag: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPostRequest {
    pub body: String,
    pub pet_id: Option<Uuid>,
    pub media_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCommentRequest {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedPageQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// Outcome of a like toggle, carrying the correlation id the caller can use
/// to recognize (and discard) the realtime echo of its own write.
#[derive(Debug, Clone, Serialize)]
pub struct LikeToggleResponse {
    pub activity_id: Uuid,
    pub liked: bool,
    pub correlation_id: Uuid,
}

// ==============================================================================
// CHANGE-EVENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedTable {
    Activities,
    ActivityLikes,
    ActivityComments,
    Notifications,
}

impl fmt::Display for FeedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedTable::Activities => write!(f, "activities"),
            FeedTable::ActivityLikes => write!(f, "activity_likes"),
            FeedTable::ActivityComments => write!(f, "activity_comments"),
            FeedTable::Notifications => write!(f, "notifications"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One change notification from the backend's per-table stream. `record` is
/// the raw row payload; consumers merge by its `id` in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: FeedTable,
    pub record: serde_json::Value,
}

impl ChangeEvent {
    pub fn record_id(&self) -> Option<Uuid> {
        self.record.get("id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Correlation id stamped on rows written through this tier; realtime
    /// echoes of our own optimistic writes carry it back.
    pub fn client_tag(&self) -> Option<Uuid> {
        self.record.get("client_tag")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn activity_id(&self) -> Option<Uuid> {
        self.record.get("activity_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Simple equality predicate over one record column.
    pub fn matches(&self, column: &str, value: &str) -> bool {
        self.record.get(column)
            .map(|v| match v {
                serde_json::Value::String(s) => s == value,
                other => other.to_string() == value,
            })
            .unwrap_or(false)
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum FeedError {
    #[error("Activity not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
