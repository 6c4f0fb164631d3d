pub mod checkout;
pub mod common;
pub mod health;
pub mod orders;
pub mod products;

use crate::{
    events::EventSender,
    gateway::PaymentGateway,
    notifications::Notifier,
    services::{
        catalog::ProductCatalogService,
        checkout::{CheckoutService, CheckoutSettings},
        inventory::InventoryService,
        orders::OrderService,
        pricing::PricingService,
    },
    AppState,
};
use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Aggregates the service layer used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<ProductCatalogService>,
    pub pricing: Arc<PricingService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        settings: CheckoutSettings,
    ) -> Self {
        let catalog = Arc::new(ProductCatalogService::new(db.clone()));
        let pricing = PricingService::new(db.clone());
        let orders = OrderService::new(db.clone(), event_sender.clone());
        let checkout = Arc::new(CheckoutService::new(
            db,
            pricing.clone(),
            InventoryService::new(),
            orders.clone(),
            gateway,
            notifier,
            event_sender,
            settings,
        ));

        Self {
            catalog,
            pricing: Arc::new(pricing),
            checkout,
            orders: Arc::new(orders),
        }
    }
}

/// Top-level router; state and middleware are attached in `crate::app`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1/products", products::product_routes())
        .nest("/api/v1/checkout", checkout::checkout_routes())
        .nest("/api/v1/orders", orders::order_routes())
}
