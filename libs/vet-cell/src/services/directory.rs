use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{VetError, VetSearchQuery, Veterinarian};

/// Read-only directory over the remote `veterinarian` table. The booking
/// flow's "vet selected" precondition resolves against these rows.
pub struct VetDirectoryService {
    supabase: SupabaseClient,
}

impl VetDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_vets(
        &self,
        query: VetSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Veterinarian>, VetError> {
        debug!("Listing veterinarians with filters: {:?}", query);

        let mut query_parts = vec!["is_verified=eq.true".to_string()];

        if query.available_only.unwrap_or(true) {
            query_parts.push("is_available=eq.true".to_string());
        }
        if let Some(specialty) = query.specialty {
            query_parts.push(format!("specialty=ilike.*{}*", specialty));
        }

        let mut path = format!(
            "/rest/v1/veterinarian?{}&order=full_name.asc",
            query_parts.join("&")
        );

        path.push_str(&format!("&limit={}", query.limit.unwrap_or(50)));
        if let Some(offset) = query.offset {
            path.push_str(&format!("&offset={}", offset));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| VetError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Veterinarian>, _>>()
            .map_err(|e| VetError::DatabaseError(format!("Failed to parse veterinarians: {}", e)))
    }

    pub async fn get_vet(
        &self,
        vet_id: Uuid,
        auth_token: &str,
    ) -> Result<Veterinarian, VetError> {
        debug!("Fetching veterinarian: {}", vet_id);

        let path = format!("/rest/v1/veterinarian?id=eq.{}", vet_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| VetError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(VetError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| VetError::DatabaseError(format!("Failed to parse veterinarian: {}", e)))
    }
}
