//! Pricing and availability validation. The sole source of truth for cart
//! totals: line items and the total are re-derived from server-held product
//! rows, and a client-submitted price is unrepresentable in the request type.

use crate::{entities::product, errors::ServiceError};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Client-submitted cart entry. Untrusted; carries no price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub customization: Option<String>,
}

/// Server-derived, trusted snapshot of a cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLineItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price_minor: i64,
    pub quantity: i32,
    pub customization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    pub lines: Vec<ResolvedLineItem>,
    pub total_minor: i64,
}

#[derive(Clone)]
pub struct PricingService {
    db: Arc<DatabaseConnection>,
}

impl PricingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Re-derives line items and the total from current product records.
    /// Read-only; all mutation happens downstream after validation succeeds.
    #[instrument(skip(self, lines))]
    pub async fn price_cart(&self, lines: &[CartLineRequest]) -> Result<PricedCart, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::InvalidPayload("cart is empty".to_string()));
        }

        let mut resolved = Vec::with_capacity(lines.len());
        let mut total_minor: i64 = 0;

        for line in lines {
            if line.quantity < 1 {
                return Err(ServiceError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: line.quantity,
                });
            }

            let product = product::Entity::find_by_id(line.product_id)
                .one(&*self.db)
                .await?
                .ok_or(ServiceError::ProductNotFound(line.product_id))?;

            if !product.active {
                return Err(ServiceError::ProductInactive(product.id));
            }

            if let Some(stock) = product.stock {
                if stock < line.quantity {
                    return Err(ServiceError::InsufficientInventory(format!(
                        "product {} has {} in stock, {} requested",
                        product.id, stock, line.quantity
                    )));
                }
            }

            let line_total = product
                .price_minor
                .checked_mul(i64::from(line.quantity))
                .ok_or_else(|| {
                    ServiceError::InvalidPayload("line total overflows".to_string())
                })?;
            total_minor = total_minor.checked_add(line_total).ok_or_else(|| {
                ServiceError::InvalidPayload("cart total overflows".to_string())
            })?;

            resolved.push(ResolvedLineItem {
                product_id: product.id,
                name: product.name,
                unit_price_minor: product.price_minor,
                quantity: line.quantity,
                customization: line.customization.clone(),
            });
        }

        Ok(PricedCart {
            lines: resolved,
            total_minor,
        })
    }
}
