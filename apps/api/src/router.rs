use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    Json, Router,
    routing::get,
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use feed_cell::router::feed_routes;
use pet_cell::router::pet_routes;
use shared_config::AppConfig;
use shop_cell::router::shop_routes;
use vet_cell::router::vet_routes;

/// Last-resort containment: a panicking handler renders a generic error
/// panel instead of tearing the connection down.
fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let detail = err.downcast_ref::<&str>().map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Something went wrong, please reload and try again" })),
    ).into_response()
}

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Petzonee API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/pets", pet_routes(state.clone()))
        .nest("/vets", vet_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/feed", feed_routes(state.clone()))
        .nest("/shop", shop_routes(state))
        .layer(CatchPanicLayer::custom(panic_response))
}
