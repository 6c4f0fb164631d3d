use crate::handlers::common::{created_response, success_response, validate_input};
use crate::{
    auth::CurrentUser,
    entities::order,
    errors::ServiceError,
    services::{
        checkout::{CodCheckout, OnlineCompletion},
        pricing::CartLineRequest,
    },
    AppState,
};
use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub fn checkout_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/intent", post(create_payment_intent))
        .route("/complete", post(complete_online_checkout))
        .route("/cod", post(cash_on_delivery_checkout))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentIntentRequest {
    #[validate(length(min = 1))]
    pub cart: Vec<CartLineRequest>,
}

/// Step one of the online protocol. Returns the gateway order and public key
/// so the client can complete payment out-of-band; no order exists yet.
async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PaymentIntentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let intent = state
        .services
        .checkout
        .create_payment_intent(&user, &payload.cart)
        .await?;
    Ok(success_response(intent))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteCheckoutRequest {
    #[validate(length(min = 1))]
    pub cart: Vec<CartLineRequest>,
    #[validate(length(min = 1))]
    pub gateway_order_id: String,
    #[validate(length(min = 1))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1))]
    pub signature: String,
    pub shipping_address: String,
    pub declared_total_minor: Option<i64>,
}

async fn complete_online_checkout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CompleteCheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let order = state
        .services
        .checkout
        .complete_online_checkout(
            &user,
            OnlineCompletion {
                cart: payload.cart,
                gateway_order_id: payload.gateway_order_id,
                gateway_payment_id: payload.gateway_payment_id,
                signature: payload.signature,
                shipping_address: payload.shipping_address,
                declared_total_minor: payload.declared_total_minor,
            },
        )
        .await?;

    Ok(created_response(OrderResponse::from(order)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CodCheckoutRequest {
    #[validate(length(min = 1))]
    pub cart: Vec<CartLineRequest>,
    pub shipping_address: String,
    pub declared_total_minor: Option<i64>,
}

async fn cash_on_delivery_checkout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CodCheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let order = state
        .services
        .checkout
        .cash_on_delivery_checkout(
            &user,
            CodCheckout {
                cart: payload.cart,
                shipping_address: payload.shipping_address,
                declared_total_minor: payload.declared_total_minor,
            },
        )
        .await?;

    Ok(created_response(OrderResponse::from(order)))
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub status: order::OrderStatus,
    pub payment_method: order::PaymentMethod,
    pub payment_status: order::PaymentStatus,
    pub total_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<order::Model> for OrderResponse {
    fn from(order: order::Model) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            total_minor: order.total_minor,
            currency: order.currency,
            created_at: order.created_at,
        }
    }
}
