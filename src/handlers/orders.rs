use crate::handlers::checkout::OrderResponse;
use crate::handlers::common::success_response;
use crate::{
    auth::{require_role, CurrentUser},
    entities::{order, order_item},
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Order lookup for the owner or an administrator.
async fn get_order(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (order, items) = state.services.orders.get_order(id).await?;

    let is_owner = order.user_id.as_deref() == Some(user.id.as_str());
    if !is_owner && !user.has_role(&state.config.admin_role) {
        return Err(ServiceError::Forbidden(
            "not the owner of this order".to_string(),
        ));
    }

    Ok(success_response(OrderDetailResponse { order, items }))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub limit: Option<u64>,
}

/// Administrative listing, newest first, bounded by the configured limit.
async fn list_orders(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    require_role(&user, &state.config.admin_role)?;

    let limit = query
        .limit
        .unwrap_or(state.config.orders_list_limit)
        .min(state.config.orders_list_limit);
    let orders = state.services.orders.list_orders(limit).await?;

    Ok(success_response(
        orders
            .into_iter()
            .map(OrderResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Enum membership is the only transition guard.
    pub status: order::OrderStatus,
}

async fn update_order_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    require_role(&user, &state.config.admin_role)?;
    let order = state.services.orders.update_status(id, payload.status).await?;
    Ok(success_response(OrderResponse::from(order)))
}
