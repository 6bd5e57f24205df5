use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

use crate::models::{CheckoutSummary, PricingBreakdown, ShopError};
use crate::services::cart::CartService;
use crate::services::catalog::CatalogService;
use crate::services::pricing::{price_cart, PricingRules};

/// Checkout: price the current cart, clear it remotely, hand back the order
/// summary. Precondition failures (empty cart, dangling product) leave the
/// cart untouched.
pub struct CheckoutService {
    cart_service: CartService,
    catalog_service: CatalogService,
    rules: PricingRules,
}

impl CheckoutService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            cart_service: CartService::new(config),
            catalog_service: CatalogService::new(config),
            rules: PricingRules::default(),
        }
    }

    /// Totals preview for the cart screen; no side effect.
    pub async fn preview(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<PricingBreakdown, ShopError> {
        let lines = self.cart_service.get_cart(user, auth_token).await?;
        if lines.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let products = self.catalog_service
            .get_products_by_ids(&CartService::product_ids(&lines), auth_token)
            .await?;

        price_cart(&lines, &products, &self.rules)
    }

    pub async fn place_order(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<CheckoutSummary, ShopError> {
        let pricing = self.preview(user, auth_token).await?;

        // The only write: the purchased lines leave the cart. Order history
        // lives with the payment provider; no orders table exists yet.
        self.cart_service.clear_cart(&user.id, auth_token).await?;

        let summary = CheckoutSummary {
            order_reference: Uuid::new_v4(),
            pricing,
            placed_at: Utc::now(),
        };

        info!(
            "Order {} placed by {} for {} cents",
            summary.order_reference, user.id, summary.pricing.total_cents
        );
        Ok(summary)
    }
}
