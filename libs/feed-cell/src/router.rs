use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
    Extension,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::stream::RealtimeHub;

pub fn feed_routes(state: Arc<AppConfig>) -> Router {
    let hub = Arc::new(RealtimeHub::new());

    let protected_routes = Router::new()
        .route("/", get(handlers::list_feed))
        .route("/", post(handlers::create_post))
        .route("/stream", get(handlers::stream_changes))
        .route("/events", post(handlers::ingest_change_event))
        .route("/notifications", get(handlers::list_notifications))
        .route("/{activity_id}/like", post(handlers::toggle_like))
        .route("/{activity_id}/comments", get(handlers::list_comments))
        .route("/{activity_id}/comments", post(handlers::add_comment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(Extension(hub));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
