use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{CartLine, SetQuantityRequest, ShopError};

pub struct CartService {
    supabase: SupabaseClient,
}

impl CartService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_cart(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<CartLine>, ShopError> {
        debug!("Fetching cart for user: {}", user.id);

        let path = format!("/rest/v1/cart?user_id=eq.{}&order=created_at.asc", user.id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<CartLine>, _>>()
            .map_err(|e| ShopError::DatabaseError(format!("Failed to parse cart: {}", e)))
    }

    /// Set a product's quantity in the cart. Zero removes the line; an
    /// existing line is updated in place, otherwise one is inserted.
    pub async fn set_quantity(
        &self,
        user: &User,
        request: SetQuantityRequest,
        auth_token: &str,
    ) -> Result<(), ShopError> {
        if request.quantity < 0 {
            return Err(ShopError::ValidationError("Quantity cannot be negative".to_string()));
        }

        let line_path = format!(
            "/rest/v1/cart?user_id=eq.{}&product_id=eq.{}",
            user.id, request.product_id
        );

        if request.quantity == 0 {
            let _: Vec<Value> = self.supabase.request(
                Method::DELETE,
                &line_path,
                Some(auth_token),
                None,
            ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;

            debug!("Removed product {} from cart of {}", request.product_id, user.id);
            return Ok(());
        }

        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &line_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        if existing.is_empty() {
            let line_data = json!({
                "user_id": user.id,
                "product_id": request.product_id,
                "quantity": request.quantity,
                "created_at": now,
                "updated_at": now
            });

            let _: Vec<Value> = self.supabase.request(
                Method::POST,
                "/rest/v1/cart",
                Some(auth_token),
                Some(line_data),
            ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;
        } else {
            let update_data = json!({
                "quantity": request.quantity,
                "updated_at": now
            });

            let _: Vec<Value> = self.supabase.request(
                Method::PATCH,
                &line_path,
                Some(auth_token),
                Some(update_data),
            ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;
        }

        debug!(
            "Cart of {} now holds {} of product {}",
            user.id, request.quantity, request.product_id
        );
        Ok(())
    }

    pub async fn clear_cart(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<(), ShopError> {
        let path = format!("/rest/v1/cart?user_id=eq.{}", user_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ShopError::DatabaseError(e.to_string()))?;

        info!("Cart cleared for user {}", user_id);
        Ok(())
    }

    pub fn product_ids(lines: &[CartLine]) -> Vec<Uuid> {
        lines.iter().map(|line| line.product_id).collect()
    }
}
