use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire format shared by every failure response.
///
/// `code` is the stable machine-readable identifier clients are expected to
/// branch on; `message` is for humans and may change between releases.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Bad Request")
    pub error: String,
    /// Stable machine-readable error code
    pub code: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Product {0} is inactive")]
    ProductInactive(Uuid),

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: Uuid, quantity: i32 },

    #[error("Insufficient inventory: {0}")]
    InsufficientInventory(String),

    #[error("Payment signature verification failed")]
    PaymentSignatureInvalid,

    #[error("Declared total {declared} does not match computed total {computed}")]
    TotalMismatch { declared: i64, computed: i64 },

    #[error("Payment gateway error: {0}")]
    UpstreamGatewayFailure(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::InvalidPayload(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::PaymentSignatureInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidPayload(_) | Self::InvalidQuantity { .. } | Self::TotalMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::ProductNotFound(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ProductInactive(_) | Self::InsufficientInventory(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::UpstreamGatewayFailure(_) => StatusCode::BAD_GATEWAY,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::ProductNotFound(_) => "product_not_found",
            Self::ProductInactive(_) => "product_inactive",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InsufficientInventory(_) => "insufficient_inventory",
            Self::PaymentSignatureInvalid => "payment_signature_invalid",
            Self::TotalMismatch { .. } => "total_mismatch",
            Self::UpstreamGatewayFailure(_) => "upstream_gateway_failure",
            Self::NotFound(_) => "not_found",
            Self::DatabaseError(_) | Self::InternalError(_) => "internal_error",
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: self.code().to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
