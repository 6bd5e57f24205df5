use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{BootstrapError, PortalState};

/// Backoff schedule for the portal's initial identity fetch. This is the
/// single place in the system where a failed remote call retries
/// automatically; everything else surfaces the error for a manual retry.
const IDENTITY_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

pub struct PortalBootstrapService {
    supabase: SupabaseClient,
    retry_delays: Vec<Duration>,
}

impl PortalBootstrapService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            retry_delays: IDENTITY_RETRY_DELAYS.to_vec(),
        }
    }

    /// Test hook: same retry count, compressed delays.
    pub fn with_retry_delays(config: &AppConfig, retry_delays: Vec<Duration>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            retry_delays,
        }
    }

    /// Assemble the portal shell state: identity row (retried), then the
    /// unread badge (best effort, a failure just shows zero).
    pub async fn fetch_portal_state(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<PortalState, BootstrapError> {
        let identity = self.fetch_identity_with_retry(&user.id, auth_token).await?;

        let unread_notifications = match self.count_unread(&user.id, auth_token).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Unread count unavailable during bootstrap: {}", e);
                0
            }
        };

        let avatar_url = identity.get("avatar_key")
            .and_then(|v| v.as_str())
            .map(|key| self.supabase.get_public_url("avatars", key));

        Ok(PortalState {
            user_id: user.id.clone(),
            role: identity.get("role")
                .and_then(|v| v.as_str())
                .unwrap_or("user")
                .to_string(),
            full_name: identity.get("full_name")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            avatar_url,
            unread_notifications,
        })
    }

    async fn fetch_identity_with_retry(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Value, BootstrapError> {
        let mut last_error = String::new();

        for attempt in 0..=self.retry_delays.len() {
            match self.fetch_identity(user_id, auth_token).await {
                Ok(identity) => {
                    if attempt > 0 {
                        debug!("Identity fetch recovered on attempt {}", attempt + 1);
                    }
                    return Ok(identity);
                }
                Err(BootstrapError::IdentityNotFound) => {
                    // A missing row won't appear on retry
                    return Err(BootstrapError::IdentityNotFound);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if let Some(delay) = self.retry_delays.get(attempt) {
                        warn!(
                            "Identity fetch attempt {} failed ({}), retrying in {:?}",
                            attempt + 1, last_error, delay
                        );
                        tokio::time::sleep(*delay).await;
                    }
                }
            }
        }

        Err(BootstrapError::IdentityUnavailable(last_error))
    }

    async fn fetch_identity(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Value, BootstrapError> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BootstrapError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(BootstrapError::IdentityNotFound)
    }

    async fn count_unread(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<usize, BootstrapError> {
        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&is_read=eq.false&select=id",
            user_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BootstrapError::DatabaseError(e.to_string()))?;

        Ok(result.len())
    }
}
