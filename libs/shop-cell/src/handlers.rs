use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CatalogQuery, SetQuantityRequest, ShopError};
use crate::services::cart::CartService;
use crate::services::catalog::CatalogService;
use crate::services::checkout::CheckoutService;

fn map_shop_error(e: ShopError) -> AppError {
    match e {
        ShopError::ProductNotFound => AppError::NotFound(e.to_string()),
        ShopError::EmptyCart => AppError::ValidationError(e.to_string()),
        ShopError::ValidationError(msg) => AppError::ValidationError(msg),
        ShopError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_products(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<CatalogQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);

    let products = catalog.list_products(query, auth.token()).await
        .map_err(map_shop_error)?;

    Ok(Json(json!({ "products": products })))
}

#[axum::debug_handler]
pub async fn get_product(
    State(state): State<Arc<AppConfig>>,
    Path(product_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);

    let page = catalog.get_product_page(product_id, auth.token()).await
        .map_err(map_shop_error)?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_cart(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let cart = CartService::new(&state);

    let lines = cart.get_cart(&user, auth.token()).await
        .map_err(map_shop_error)?;

    Ok(Json(json!({ "cart": lines })))
}

#[axum::debug_handler]
pub async fn set_cart_quantity(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<Value>, AppError> {
    let cart = CartService::new(&state);

    cart.set_quantity(&user, request, auth.token()).await
        .map_err(map_shop_error)?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn preview_checkout(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let checkout = CheckoutService::new(&state);

    let pricing = checkout.preview(&user, auth.token()).await
        .map_err(map_shop_error)?;

    Ok(Json(json!(pricing)))
}

#[axum::debug_handler]
pub async fn place_order(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let checkout = CheckoutService::new(&state);

    let summary = checkout.place_order(&user, auth.token()).await
        .map_err(map_shop_error)?;

    Ok(Json(json!({
        "success": true,
        "order": summary,
        "message": "Order placed successfully"
    })))
}
