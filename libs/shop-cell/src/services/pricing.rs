//! Checkout totals calculator.
//!
//! Pure integer-cent arithmetic over the cart: per-line totals, order
//! subtotal, a flat shipping fee waived above a threshold, grand total.

use crate::models::{CartLine, PricedLine, PricingBreakdown, Product, ShopError};

#[derive(Debug, Clone)]
pub struct PricingRules {
    pub flat_shipping_cents: i64,
    pub free_shipping_threshold_cents: i64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            flat_shipping_cents: 499,
            free_shipping_threshold_cents: 5000,
        }
    }
}

/// Price a cart against its resolved products. Every cart line must resolve
/// to a product; a dangling reference fails the whole computation.
pub fn price_cart(
    lines: &[CartLine],
    products: &[Product],
    rules: &PricingRules,
) -> Result<PricingBreakdown, ShopError> {
    if lines.is_empty() {
        return Err(ShopError::EmptyCart);
    }

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(ShopError::ValidationError(
                format!("Invalid quantity {} in cart", line.quantity),
            ));
        }

        let product = products.iter()
            .find(|p| p.id == line.product_id)
            .ok_or(ShopError::ProductNotFound)?;

        priced.push(PricedLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity: line.quantity,
            line_total_cents: product.price_cents * line.quantity as i64,
        });
    }

    let subtotal_cents: i64 = priced.iter().map(|l| l.line_total_cents).sum();
    let shipping_cents = if subtotal_cents >= rules.free_shipping_threshold_cents {
        0
    } else {
        rules.flat_shipping_cents
    };

    Ok(PricingBreakdown {
        lines: priced,
        subtotal_cents,
        shipping_cents,
        total_cents: subtotal_cents + shipping_cents,
    })
}
