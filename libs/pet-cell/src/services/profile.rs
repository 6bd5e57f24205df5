use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    CreatePetRequest, GalleryItem, Pet, PetError, PetMedia, PetWithGallery,
    UpdatePetRequest,
};

pub struct PetProfileService {
    supabase: SupabaseClient,
}

impl PetProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_my_pets(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Pet>, PetError> {
        debug!("Listing pets for owner: {}", user.id);

        let path = format!("/rest/v1/pets?owner_id=eq.{}&order=created_at.asc", user.id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PetError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Pet>, _>>()
            .map_err(|e| PetError::DatabaseError(format!("Failed to parse pets: {}", e)))
    }

    /// Pet profile with its photo gallery, storage keys resolved to public
    /// URLs. Profiles are public to any signed-in user; only mutation is
    /// owner-gated.
    pub async fn get_pet_with_gallery(
        &self,
        pet_id: Uuid,
        auth_token: &str,
    ) -> Result<PetWithGallery, PetError> {
        let pet = self.get_pet(pet_id, auth_token).await?;
        let media = self.get_gallery(pet_id, auth_token).await?;

        let avatar_url = pet.avatar_key.as_deref()
            .map(|key| self.supabase.get_public_url("avatars", key));

        let gallery = media.into_iter()
            .map(|item| GalleryItem {
                id: item.id,
                url: self.supabase.get_public_url(&item.bucket, &item.object_key),
                caption: item.caption,
                created_at: item.created_at,
            })
            .collect();

        Ok(PetWithGallery { pet, avatar_url, gallery })
    }

    pub async fn create_pet(
        &self,
        user: &User,
        request: CreatePetRequest,
        auth_token: &str,
    ) -> Result<Pet, PetError> {
        if request.name.trim().is_empty() {
            return Err(PetError::ValidationError("Pet name is required".to_string()));
        }
        if request.species.trim().is_empty() {
            return Err(PetError::ValidationError("Pet species is required".to_string()));
        }

        let now = Utc::now();
        let pet_data = json!({
            "owner_id": user.id,
            "name": request.name,
            "species": request.species,
            "breed": request.breed,
            "birth_date": request.birth_date,
            "bio": request.bio,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/pets",
            Some(auth_token),
            Some(pet_data),
            Some(headers),
        ).await.map_err(|e| PetError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(PetError::DatabaseError("Failed to create pet".to_string()));
        }

        let pet: Pet = serde_json::from_value(result[0].clone())
            .map_err(|e| PetError::DatabaseError(format!("Failed to parse created pet: {}", e)))?;

        info!("Pet {} created for owner {}", pet.id, user.id);
        Ok(pet)
    }

    pub async fn update_pet(
        &self,
        pet_id: Uuid,
        user: &User,
        request: UpdatePetRequest,
        auth_token: &str,
    ) -> Result<Pet, PetError> {
        let current = self.get_pet(pet_id, auth_token).await?;
        self.ensure_owner(&current, user)?;

        let mut update_data = serde_json::Map::new();
        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(PetError::ValidationError("Pet name cannot be empty".to_string()));
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(species) = request.species {
            update_data.insert("species".to_string(), json!(species));
        }
        if let Some(breed) = request.breed {
            update_data.insert("breed".to_string(), json!(breed));
        }
        if let Some(birth_date) = request.birth_date {
            update_data.insert("birth_date".to_string(), json!(birth_date));
        }
        if let Some(bio) = request.bio {
            update_data.insert("bio".to_string(), json!(bio));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/pets?id=eq.{}", pet_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| PetError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(PetError::DatabaseError("Failed to update pet".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| PetError::DatabaseError(format!("Failed to parse updated pet: {}", e)))
    }

    pub async fn delete_pet(
        &self,
        pet_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), PetError> {
        let current = self.get_pet(pet_id, auth_token).await?;
        self.ensure_owner(&current, user)?;

        // Gallery rows go first so no orphaned keys remain
        let media_path = format!("/rest/v1/pet_media?pet_id=eq.{}", pet_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &media_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PetError::DatabaseError(e.to_string()))?;

        let path = format!("/rest/v1/pets?id=eq.{}", pet_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PetError::DatabaseError(e.to_string()))?;

        info!("Pet {} deleted by owner {}", pet_id, user.id);
        Ok(())
    }

    async fn get_pet(&self, pet_id: Uuid, auth_token: &str) -> Result<Pet, PetError> {
        let path = format!("/rest/v1/pets?id=eq.{}", pet_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PetError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(PetError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| PetError::DatabaseError(format!("Failed to parse pet: {}", e)))
    }

    async fn get_gallery(&self, pet_id: Uuid, auth_token: &str) -> Result<Vec<PetMedia>, PetError> {
        let path = format!("/rest/v1/pet_media?pet_id=eq.{}&order=created_at.desc", pet_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PetError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<PetMedia>, _>>()
            .map_err(|e| PetError::DatabaseError(format!("Failed to parse pet media: {}", e)))
    }

    fn ensure_owner(&self, pet: &Pet, user: &User) -> Result<(), PetError> {
        if pet.owner_id.to_string() != user.id && !user.is_admin() {
            return Err(PetError::Unauthorized);
        }
        Ok(())
    }
}
