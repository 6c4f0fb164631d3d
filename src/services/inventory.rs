//! Inventory adjustment. Each decrement is a single conditional update scoped
//! to one product row, so two concurrent checkouts can never both consume the
//! same units: the losing side gets zero rows affected and the checkout
//! aborts with `InsufficientInventory` instead of clamping.

use crate::{entities::product, errors::ServiceError, services::pricing::ResolvedLineItem};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use tracing::debug;
use uuid::Uuid;

/// Stock decrement applied for one checkout, reported for post-commit events.
#[derive(Debug, Clone)]
pub struct AppliedAdjustment {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Clone, Default)]
pub struct InventoryService;

impl InventoryService {
    pub fn new() -> Self {
        Self
    }

    /// Applies per-item stock decrements inside the caller's transaction.
    ///
    /// A product that vanished or was deactivated since pricing hard-fails
    /// the whole checkout; untracked products are skipped. The enclosing
    /// transaction makes the set of decrements atomic with the order write.
    pub async fn decrement_for_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        lines: &[ResolvedLineItem],
    ) -> Result<Vec<AppliedAdjustment>, ServiceError> {
        let mut applied = Vec::new();

        for line in lines {
            let current = product::Entity::find_by_id(line.product_id)
                .one(conn)
                .await?
                .ok_or(ServiceError::ProductNotFound(line.product_id))?;

            if !current.active {
                return Err(ServiceError::ProductInactive(current.id));
            }

            if current.stock.is_none() {
                debug!(product_id = %line.product_id, "stock untracked, skipping decrement");
                continue;
            }

            let result = product::Entity::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(line.quantity),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(product::Column::Id.eq(line.product_id))
                .filter(product::Column::Stock.gte(line.quantity))
                .exec(conn)
                .await?;

            if result.rows_affected == 0 {
                return Err(ServiceError::InsufficientInventory(format!(
                    "stock for product {} changed during checkout",
                    line.product_id
                )));
            }

            applied.push(AppliedAdjustment {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }

        Ok(applied)
    }
}
