use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreatePetRequest, PetError, UpdatePetRequest};
use crate::services::profile::PetProfileService;

fn map_pet_error(e: PetError) -> AppError {
    match e {
        PetError::NotFound => AppError::NotFound(e.to_string()),
        PetError::Unauthorized => AppError::Auth(e.to_string()),
        PetError::ValidationError(msg) => AppError::ValidationError(msg),
        PetError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_my_pets(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = PetProfileService::new(&state);

    let pets = service.list_my_pets(&user, auth.token()).await
        .map_err(map_pet_error)?;

    Ok(Json(json!({ "pets": pets })))
}

#[axum::debug_handler]
pub async fn get_pet(
    State(state): State<Arc<AppConfig>>,
    Path(pet_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = PetProfileService::new(&state);

    let pet = service.get_pet_with_gallery(pet_id, auth.token()).await
        .map_err(map_pet_error)?;

    Ok(Json(json!(pet)))
}

#[axum::debug_handler]
pub async fn create_pet(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePetRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PetProfileService::new(&state);

    let pet = service.create_pet(&user, request, auth.token()).await
        .map_err(map_pet_error)?;

    Ok(Json(json!({
        "success": true,
        "pet": pet
    })))
}

#[axum::debug_handler]
pub async fn update_pet(
    State(state): State<Arc<AppConfig>>,
    Path(pet_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePetRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PetProfileService::new(&state);

    let pet = service.update_pet(pet_id, &user, request, auth.token()).await
        .map_err(map_pet_error)?;

    Ok(Json(json!({
        "success": true,
        "pet": pet
    })))
}

#[axum::debug_handler]
pub async fn delete_pet(
    State(state): State<Arc<AppConfig>>,
    Path(pet_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = PetProfileService::new(&state);

    service.delete_pet(pet_id, &user, auth.token()).await
        .map_err(map_pet_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Pet profile removed"
    })))
}
