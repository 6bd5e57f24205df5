use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn pet_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_my_pets))
        .route("/", post(handlers::create_pet))
        .route("/{pet_id}", get(handlers::get_pet))
        .route("/{pet_id}", put(handlers::update_pet))
        .route("/{pet_id}", delete(handlers::delete_pet))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
