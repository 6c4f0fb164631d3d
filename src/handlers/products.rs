use crate::handlers::common::{created_response, success_response, validate_input};
use crate::{
    auth::{require_role, CurrentUser, MaybeUser},
    errors::ServiceError,
    services::catalog::{CreateProductInput, UpdateProductInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_product))
        .route("/:id", get(get_product).put(update_product))
        .route("/:id/deactivate", post(deactivate_product))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0))]
    pub price_minor: i64,
    pub stock: Option<i32>,
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    require_role(&user, &state.config.admin_role)?;
    validate_input(&payload)?;

    let product = state
        .services
        .catalog
        .create_product(CreateProductInput {
            name: payload.name,
            description: payload.description,
            price_minor: payload.price_minor,
            stock: payload.stock,
        })
        .await?;

    Ok(created_response(product))
}

/// Public product read. Inactive products stay visible to administrators
/// only; everyone else sees them as missing.
async fn get_product(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.get_product(id).await?;

    let is_admin = user
        .as_ref()
        .map_or(false, |u| u.has_role(&state.config.admin_role));
    if !product.active && !is_admin {
        return Err(ServiceError::ProductNotFound(id));
    }

    Ok(success_response(product))
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price_minor: Option<i64>,
    pub active: Option<bool>,
    pub stock: Option<i32>,
    /// Switches the product to untracked inventory. Takes precedence over
    /// `stock`.
    #[serde(default)]
    pub clear_stock: bool,
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    require_role(&user, &state.config.admin_role)?;
    validate_input(&payload)?;

    let stock = if payload.clear_stock {
        Some(None)
    } else {
        payload.stock.map(Some)
    };

    let product = state
        .services
        .catalog
        .update_product(
            id,
            UpdateProductInput {
                name: payload.name,
                description: payload.description,
                price_minor: payload.price_minor,
                active: payload.active,
                stock,
            },
        )
        .await?;

    Ok(success_response(product))
}

async fn deactivate_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    require_role(&user, &state.config.admin_role)?;
    let product = state.services.catalog.deactivate_product(id).await?;
    Ok(success_response(product))
}
