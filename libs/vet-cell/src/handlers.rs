use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{VetError, VetSearchQuery};
use crate::services::directory::VetDirectoryService;

fn map_vet_error(e: VetError) -> AppError {
    match e {
        VetError::NotFound => AppError::NotFound(e.to_string()),
        VetError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_vets(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<VetSearchQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let directory = VetDirectoryService::new(&state);

    let vets = directory.list_vets(query, auth.token()).await
        .map_err(map_vet_error)?;

    Ok(Json(json!({ "veterinarians": vets })))
}

#[axum::debug_handler]
pub async fn get_vet(
    State(state): State<Arc<AppConfig>>,
    Path(vet_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let directory = VetDirectoryService::new(&state);

    let vet = directory.get_vet(vet_id, auth.token()).await
        .map_err(map_vet_error)?;

    Ok(Json(json!(vet)))
}
