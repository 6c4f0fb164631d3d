//! Order persistence. An order is written exactly once per successful
//! checkout; afterwards only `status` and `updated_at` are ever touched.

use crate::{
    entities::{
        order::{self, OrderStatus, PaymentMethod, PaymentStatus},
        order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::pricing::ResolvedLineItem,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveEnum, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Everything the order writer needs to persist one order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<String>,
    pub lines: Vec<ResolvedLineItem>,
    pub total_minor: i64,
    pub currency: String,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub payment_verified_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Persists the order header and its embedded line items in the caller's
    /// transaction. Exactly one order row per call.
    pub async fn create_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        new_order: NewOrder,
    ) -> Result<order::Model, ServiceError> {
        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(new_order.user_id),
            status: Set(OrderStatus::Pending),
            payment_method: Set(new_order.payment_method),
            payment_status: Set(new_order.payment_status),
            total_minor: Set(new_order.total_minor),
            currency: Set(new_order.currency),
            shipping_address: Set(new_order.shipping_address),
            gateway_order_id: Set(new_order.gateway_order_id),
            gateway_payment_id: Set(new_order.gateway_payment_id),
            payment_verified_at: Set(new_order.payment_verified_at),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        for line in &new_order.lines {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                name: Set(line.name.clone()),
                unit_price_minor: Set(line.unit_price_minor),
                quantity: Set(line.quantity),
                customization: Set(line.customization.clone()),
                created_at: Set(now),
            }
            .insert(conn)
            .await?;
        }

        Ok(order)
    }

    pub async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let order = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {} not found", id)))?;
        let items = order.find_related(order_item::Entity).all(&*self.db).await?;
        Ok((order, items))
    }

    /// Administrative listing, newest first.
    pub async fn list_orders(&self, limit: u64) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    /// Post-creation writes touch only `status` and `updated_at`; items and
    /// total are immutable.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let order = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {} not found", id)))?;

        let old_status = order.status;
        let mut update: order::ActiveModel = order.into();
        update.status = Set(new_status);
        update.updated_at = Set(Utc::now());
        let updated = update.update(&*self.db).await?;

        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id: id,
                old_status: old_status.to_value(),
                new_status: new_status.to_value(),
            })
            .await;

        info!(order_id = %id, from = %old_status.to_value(), to = %new_status.to_value(), "order status updated");
        Ok(updated)
    }
}
