//! Checkout orchestration: the online-payment and cash-on-delivery protocols.
//!
//! All validation happens before any persistence; the stock decrements and
//! the order insert then share one transaction, so a failed checkout writes
//! nothing. Confirmation email is dispatched after commit and its outcome
//! never affects the order.

use crate::{
    entities::order::{self, PaymentMethod, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{self, PaymentGateway},
    notifications::{self, Notifier},
    services::{
        inventory::{AppliedAdjustment, InventoryService},
        orders::{NewOrder, OrderService},
        pricing::{CartLineRequest, PricedCart, PricingService},
    },
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::Identity;

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub currency: String,
    /// Shared secret for payment signature verification.
    pub signature_secret: String,
    /// Allowed absolute drift for the client-declared total guard.
    pub total_tolerance_minor: i64,
}

/// Gateway order handed back to the caller so it can complete payment
/// out-of-band. Not an order; nothing is persisted at this point.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub gateway_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Clone)]
pub struct OnlineCompletion {
    pub cart: Vec<CartLineRequest>,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    pub shipping_address: String,
    pub declared_total_minor: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CodCheckout {
    pub cart: Vec<CartLineRequest>,
    pub shipping_address: String,
    pub declared_total_minor: Option<i64>,
}

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    pricing: PricingService,
    inventory: InventoryService,
    orders: OrderService,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    event_sender: EventSender,
    settings: CheckoutSettings,
}

impl CheckoutService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<DatabaseConnection>,
        pricing: PricingService,
        inventory: InventoryService,
        orders: OrderService,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        event_sender: EventSender,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            db,
            pricing,
            inventory,
            orders,
            gateway,
            notifier,
            event_sender,
            settings,
        }
    }

    /// Online protocol, first half: price the cart with trusted data and
    /// create a gateway order for the computed total. Persists nothing; a
    /// gateway failure surfaces directly.
    #[instrument(skip(self, cart), fields(user_id = %user.id))]
    pub async fn create_payment_intent(
        &self,
        user: &Identity,
        cart: &[CartLineRequest],
    ) -> Result<PaymentIntent, ServiceError> {
        let priced = self.pricing.price_cart(cart).await?;
        let receipt = Uuid::new_v4().to_string();

        let gateway_order = self
            .gateway
            .create_order(priced.total_minor, &self.settings.currency, &receipt)
            .await?;

        info!(
            total_minor = priced.total_minor,
            gateway_order_id = %gateway_order.gateway_order_id,
            "payment intent created"
        );

        Ok(PaymentIntent {
            gateway_order_id: gateway_order.gateway_order_id,
            amount_minor: gateway_order.amount_minor,
            currency: gateway_order.currency,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Online protocol, second half: the caller returns the gateway
    /// identifiers and signature together with the original cart.
    ///
    /// The cart is re-priced (inputs may have gone stale since intent
    /// creation) and the signature is verified before anything is written.
    #[instrument(skip(self, completion), fields(user_id = %user.id))]
    pub async fn complete_online_checkout(
        &self,
        user: &Identity,
        completion: OnlineCompletion,
    ) -> Result<order::Model, ServiceError> {
        if completion.shipping_address.trim().is_empty() {
            return Err(ServiceError::InvalidPayload(
                "shipping address is required".to_string(),
            ));
        }

        let priced = self.pricing.price_cart(&completion.cart).await?;
        self.check_declared_total(&priced, completion.declared_total_minor)?;

        if !gateway::verify_payment_signature(
            &self.settings.signature_secret,
            &completion.gateway_order_id,
            &completion.gateway_payment_id,
            &completion.signature,
        ) {
            warn!(
                gateway_order_id = %completion.gateway_order_id,
                "rejected payment claim with invalid signature"
            );
            return Err(ServiceError::PaymentSignatureInvalid);
        }

        let new_order = NewOrder {
            user_id: Some(user.id.clone()),
            lines: priced.lines.clone(),
            total_minor: priced.total_minor,
            currency: self.settings.currency.clone(),
            shipping_address: completion.shipping_address,
            payment_method: PaymentMethod::Online,
            payment_status: PaymentStatus::Paid,
            gateway_order_id: Some(completion.gateway_order_id),
            gateway_payment_id: Some(completion.gateway_payment_id.clone()),
            payment_verified_at: Some(Utc::now()),
        };

        let (order, adjustments) = self.persist(new_order, &priced).await?;

        self.event_sender
            .send(Event::PaymentVerified {
                order_id: order.id,
                gateway_payment_id: completion.gateway_payment_id,
            })
            .await;
        self.after_commit(&order, &priced, user, adjustments).await;

        info!(order_id = %order.id, "online checkout completed");
        Ok(order)
    }

    /// Cash-on-delivery protocol. The address check runs before any product
    /// lookup.
    #[instrument(skip(self, request), fields(user_id = %user.id))]
    pub async fn cash_on_delivery_checkout(
        &self,
        user: &Identity,
        request: CodCheckout,
    ) -> Result<order::Model, ServiceError> {
        if request.shipping_address.trim().is_empty() {
            return Err(ServiceError::InvalidPayload(
                "shipping address is required".to_string(),
            ));
        }

        let priced = self.pricing.price_cart(&request.cart).await?;
        self.check_declared_total(&priced, request.declared_total_minor)?;

        let new_order = NewOrder {
            user_id: Some(user.id.clone()),
            lines: priced.lines.clone(),
            total_minor: priced.total_minor,
            currency: self.settings.currency.clone(),
            shipping_address: request.shipping_address,
            payment_method: PaymentMethod::CashOnDelivery,
            payment_status: PaymentStatus::AwaitingCollection,
            gateway_order_id: None,
            gateway_payment_id: None,
            payment_verified_at: None,
        };

        let (order, adjustments) = self.persist(new_order, &priced).await?;
        self.after_commit(&order, &priced, user, adjustments).await;

        info!(order_id = %order.id, "cash-on-delivery checkout completed");
        Ok(order)
    }

    /// Consistency guard: a client-declared total must agree with the
    /// server-recomputed one within the configured tolerance.
    fn check_declared_total(
        &self,
        priced: &PricedCart,
        declared: Option<i64>,
    ) -> Result<(), ServiceError> {
        if let Some(declared) = declared {
            // Widen before subtracting; `declared` is untrusted and may sit at
            // the i64 extremes.
            let drift = (i128::from(declared) - i128::from(priced.total_minor)).abs();
            if drift > i128::from(self.settings.total_tolerance_minor) {
                return Err(ServiceError::TotalMismatch {
                    declared,
                    computed: priced.total_minor,
                });
            }
        }
        Ok(())
    }

    /// One transaction for the stock decrements and the order insert; any
    /// failure rolls back both.
    async fn persist(
        &self,
        new_order: NewOrder,
        priced: &PricedCart,
    ) -> Result<(order::Model, Vec<AppliedAdjustment>), ServiceError> {
        let txn = self.db.begin().await?;
        let adjustments = self.inventory.decrement_for_order(&txn, &priced.lines).await?;
        let order = self.orders.create_order(&txn, new_order).await?;
        txn.commit().await?;
        Ok((order, adjustments))
    }

    async fn after_commit(
        &self,
        order: &order::Model,
        priced: &PricedCart,
        user: &Identity,
        adjustments: Vec<AppliedAdjustment>,
    ) {
        for adjustment in adjustments {
            self.event_sender
                .send(Event::InventoryAdjusted {
                    product_id: adjustment.product_id,
                    quantity: adjustment.quantity,
                })
                .await;
        }
        self.event_sender.send(Event::OrderCreated(order.id)).await;

        if let Some(email) = user.email.clone() {
            let message = notifications::order_confirmation(order, &priced.lines, &email);
            let notifier = self.notifier.clone();
            let order_id = order.id;
            // Fire and forget: the order is already committed.
            tokio::spawn(async move {
                if let Err(err) = notifier.send(message).await {
                    warn!(%order_id, "order confirmation email failed: {}", err);
                }
            });
        }
    }
}
