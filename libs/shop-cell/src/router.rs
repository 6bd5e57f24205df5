use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn shop_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        .route("/cart", get(handlers::get_cart))
        .route("/cart", put(handlers::set_cart_quantity))
        .route("/checkout/preview", get(handlers::preview_checkout))
        .route("/checkout", post(handlers::place_order))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
