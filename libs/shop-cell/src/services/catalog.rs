use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CatalogQuery, Product, ProductDetail, ProductPage, ShopError};

pub struct CatalogService {
    supabase: SupabaseClient,
}

impl CatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_products(
        &self,
        query: CatalogQuery,
        auth_token: &str,
    ) -> Result<Vec<Product>, ShopError> {
        debug!("Listing products with filters: {:?}", query);

        let mut query_parts = Vec::new();

        if query.in_stock_only.unwrap_or(false) {
            query_parts.push("in_stock=eq.true".to_string());
        }
        if let Some(search) = query.search {
            query_parts.push(format!("name=ilike.*{}*", search));
        }

        let filters = if query_parts.is_empty() {
            String::new()
        } else {
            format!("{}&", query_parts.join("&"))
        };

        let mut path = format!(
            "/rest/v1/products?{}order=name.asc&limit={}",
            filters,
            query.limit.unwrap_or(50)
        );
        if let Some(offset) = query.offset {
            path.push_str(&format!("&offset={}", offset));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Product>, _>>()
            .map_err(|e| ShopError::DatabaseError(format!("Failed to parse products: {}", e)))
    }

    /// Product page: the base row, its extended `product_details` copy if
    /// one exists, and a public image URL resolved from the stored key.
    pub async fn get_product_page(
        &self,
        product_id: Uuid,
        auth_token: &str,
    ) -> Result<ProductPage, ShopError> {
        let product = self.get_product(product_id, auth_token).await?;

        let detail_path = format!("/rest/v1/product_details?product_id=eq.{}", product_id);
        let detail_rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &detail_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;

        let detail: Option<ProductDetail> = match detail_rows.into_iter().next() {
            Some(row) => Some(
                serde_json::from_value(row)
                    .map_err(|e| ShopError::DatabaseError(format!("Failed to parse product detail: {}", e)))?,
            ),
            None => None,
        };

        let image_url = product.image_key.as_deref()
            .map(|key| self.supabase.get_public_url("pet-media", key));

        Ok(ProductPage { product, image_url, detail })
    }

    pub async fn get_product(
        &self,
        product_id: Uuid,
        auth_token: &str,
    ) -> Result<Product, ShopError> {
        let path = format!("/rest/v1/products?id=eq.{}", product_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ShopError::ProductNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ShopError::DatabaseError(format!("Failed to parse product: {}", e)))
    }

    /// Resolve several products at once for cart pricing.
    pub async fn get_products_by_ids(
        &self,
        product_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<Product>, ShopError> {
        if product_ids.is_empty() {
            return Ok(vec![]);
        }

        let id_list = product_ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/products?id=in.({})", id_list);

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Product>, _>>()
            .map_err(|e| ShopError::DatabaseError(format!("Failed to parse products: {}", e)))
    }
}
