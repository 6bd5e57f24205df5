use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    Activity, ActivityComment, FeedError, FeedPageQuery, LikeToggleResponse,
    NewCommentRequest, NewPostRequest, Notification,
};

pub struct FeedService {
    supabase: SupabaseClient,
}

impl FeedService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// One feed page, newest first.
    pub async fn list_feed(
        &self,
        query: FeedPageQuery,
        auth_token: &str,
    ) -> Result<Vec<Activity>, FeedError> {
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = query.offset.unwrap_or(0).max(0);

        let path = format!(
            "/rest/v1/activities?order=created_at.desc&limit={}&offset={}",
            limit, offset
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Activity>, _>>()
            .map_err(|e| FeedError::DatabaseError(format!("Failed to parse activities: {}", e)))
    }

    pub async fn create_post(
        &self,
        user: &User,
        request: NewPostRequest,
        auth_token: &str,
    ) -> Result<Activity, FeedError> {
        if request.body.trim().is_empty() {
            return Err(FeedError::ValidationError("Post body is required".to_string()));
        }

        let now = Utc::now();
        let post_data = json!({
            "author_id": user.id,
            "pet_id": request.pet_id,
            "body": request.body,
            "media_key": request.media_key,
            "like_count": 0,
            "comment_count": 0,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/activities",
            Some(auth_token),
            Some(post_data),
            Some(headers),
        ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(FeedError::DatabaseError("Failed to create post".to_string()));
        }

        let activity: Activity = serde_json::from_value(result[0].clone())
            .map_err(|e| FeedError::DatabaseError(format!("Failed to parse created post: {}", e)))?;

        info!("Activity {} posted by {}", activity.id, user.id);
        Ok(activity)
    }

    /// Toggle the caller's like on an activity. The write carries a fresh
    /// correlation id (`client_tag`) so the caller's state store can discard
    /// the realtime echo of this same action.
    pub async fn toggle_like(
        &self,
        activity_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<LikeToggleResponse, FeedError> {
        self.ensure_activity_exists(activity_id, auth_token).await?;

        let correlation_id = Uuid::new_v4();

        let existing_path = format!(
            "/rest/v1/activity_likes?activity_id=eq.{}&user_id=eq.{}",
            activity_id, user.id
        );
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

        if existing.is_empty() {
            let like_data = json!({
                "activity_id": activity_id,
                "user_id": user.id,
                "client_tag": correlation_id,
                "created_at": Utc::now().to_rfc3339()
            });

            let _: Vec<Value> = self.supabase.request(
                Method::POST,
                "/rest/v1/activity_likes",
                Some(auth_token),
                Some(like_data),
            ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

            debug!("User {} liked activity {} (tag {})", user.id, activity_id, correlation_id);
            Ok(LikeToggleResponse { activity_id, liked: true, correlation_id })
        } else {
            let _: Vec<Value> = self.supabase.request(
                Method::DELETE,
                &existing_path,
                Some(auth_token),
                None,
            ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

            debug!("User {} unliked activity {}", user.id, activity_id);
            Ok(LikeToggleResponse { activity_id, liked: false, correlation_id })
        }
    }

    pub async fn add_comment(
        &self,
        activity_id: Uuid,
        user: &User,
        request: NewCommentRequest,
        auth_token: &str,
    ) -> Result<ActivityComment, FeedError> {
        if request.body.trim().is_empty() {
            return Err(FeedError::ValidationError("Comment body is required".to_string()));
        }

        self.ensure_activity_exists(activity_id, auth_token).await?;

        let correlation_id = Uuid::new_v4();
        let comment_data = json!({
            "activity_id": activity_id,
            "author_id": user.id,
            "body": request.body,
            "client_tag": correlation_id,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/activity_comments",
            Some(auth_token),
            Some(comment_data),
            Some(headers),
        ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(FeedError::DatabaseError("Failed to create comment".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| FeedError::DatabaseError(format!("Failed to parse created comment: {}", e)))
    }

    pub async fn list_comments(
        &self,
        activity_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<ActivityComment>, FeedError> {
        let path = format!(
            "/rest/v1/activity_comments?activity_id=eq.{}&order=created_at.asc",
            activity_id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<ActivityComment>, _>>()
            .map_err(|e| FeedError::DatabaseError(format!("Failed to parse comments: {}", e)))
    }

    pub async fn list_notifications(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Notification>, FeedError> {
        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&order=created_at.desc&limit=50",
            user.id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Notification>, _>>()
            .map_err(|e| FeedError::DatabaseError(format!("Failed to parse notifications: {}", e)))
    }

    pub async fn unread_notification_count(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<usize, FeedError> {
        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&is_read=eq.false&select=id",
            user.id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

        Ok(result.len())
    }

    async fn ensure_activity_exists(
        &self,
        activity_id: Uuid,
        auth_token: &str,
    ) -> Result<(), FeedError> {
        let path = format!("/rest/v1/activities?id=eq.{}&select=id", activity_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| FeedError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(FeedError::NotFound);
        }

        Ok(())
    }
}
