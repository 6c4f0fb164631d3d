//! Product ledger access: reads and administrative writes on the catalog.
//! Products referenced by historical orders are never deleted, only
//! deactivated.

use crate::{entities::product, errors::ServiceError};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub name: String,
    pub description: String,
    pub price_minor: i64,
    /// `None` leaves inventory untracked.
    pub stock: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_minor: Option<i64>,
    pub active: Option<bool>,
    /// Outer `None` leaves stock untouched; `Some(None)` switches the product
    /// to untracked inventory.
    pub stock: Option<Option<i32>>,
}

#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if input.price_minor < 0 {
            return Err(ServiceError::InvalidPayload(
                "price must not be negative".to_string(),
            ));
        }
        if matches!(input.stock, Some(s) if s < 0) {
            return Err(ServiceError::InvalidPayload(
                "stock must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            price_minor: Set(input.price_minor),
            active: Set(true),
            stock: Set(input.stock),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::ProductNotFound(id))
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if matches!(input.price_minor, Some(p) if p < 0) {
            return Err(ServiceError::InvalidPayload(
                "price must not be negative".to_string(),
            ));
        }
        if matches!(input.stock, Some(Some(s)) if s < 0) {
            return Err(ServiceError::InvalidPayload(
                "stock must not be negative".to_string(),
            ));
        }

        let existing = self.get_product(id).await?;
        let mut update: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            update.name = Set(name);
        }
        if let Some(description) = input.description {
            update.description = Set(description);
        }
        if let Some(price_minor) = input.price_minor {
            update.price_minor = Set(price_minor);
        }
        if let Some(active) = input.active {
            update.active = Set(active);
        }
        if let Some(stock) = input.stock {
            update.stock = Set(stock);
        }
        update.updated_at = Set(Utc::now());

        Ok(update.update(&*self.db).await?)
    }

    /// Soft-deactivation; the row stays for historical orders.
    #[instrument(skip(self))]
    pub async fn deactivate_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;
        let mut update: product::ActiveModel = existing.into();
        update.active = Set(false);
        update.updated_at = Set(Utc::now());
        let product = update.update(&*self.db).await?;
        info!(product_id = %product.id, "product deactivated");
        Ok(product)
    }
}
