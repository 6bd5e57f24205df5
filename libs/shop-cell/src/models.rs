use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

// ==============================================================================
// CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Integer cents; all pricing math stays in integers.
    pub price_cents: i64,
    pub image_key: Option<String>,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Extended copy from `product_details`, shown on the product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product_id: Uuid,
    pub long_description: Option<String>,
    pub ingredients: Option<String>,
    pub weight_grams: Option<i64>,
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    #[serde(flatten)]
    pub product: Product,
    pub image_url: Option<String>,
    pub detail: Option<ProductDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub in_stock_only: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

// ==============================================================================
// CART & CHECKOUT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetQuantityRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// One priced cart line: quantity times the product's unit price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub line_total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingBreakdown {
    pub lines: Vec<PricedLine>,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSummary {
    pub order_reference: Uuid,
    pub pricing: PricingBreakdown,
    pub placed_at: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ShopError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
