//! Transactional email. Delivery is strictly fire-and-forget: a failure here
//! is logged by the caller and never rolls back an already persisted order.

use crate::entities::order;
use crate::errors::ServiceError;
use crate::services::pricing::ResolvedLineItem;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), ServiceError>;
}

/// Client for an HTTP JSON email API (bearer-authenticated).
pub struct HttpEmailNotifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailNotifier {
    pub fn new(
        api_url: String,
        api_key: String,
        from: String,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client init failed: {}", e)))?;
        Ok(Self {
            http,
            api_url,
            api_key,
            from,
        })
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl Notifier for HttpEmailNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), ServiceError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &self.from,
                to: &message.to,
                subject: &message.subject,
                text: &message.body,
            })
            .send()
            .await
            .map_err(|e| ServiceError::InternalError(format!("email request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::InternalError(format!(
                "email provider returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Used when no email provider is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), ServiceError> {
        info!(to = %message.to, "email delivery disabled, dropping message");
        Ok(())
    }
}

/// Renders the plain-text order confirmation for a freshly placed order.
pub fn order_confirmation(
    order: &order::Model,
    lines: &[ResolvedLineItem],
    to: &str,
) -> EmailMessage {
    let mut body = format!(
        "Thank you for your order!\n\nOrder {}\n\nItems:\n",
        order.id
    );
    for line in lines {
        body.push_str(&format!(
            "  {} x{} @ {} {}\n",
            line.name, line.quantity, line.unit_price_minor, order.currency
        ));
    }
    body.push_str(&format!(
        "\nTotal: {} {}\nShipping to: {}\n",
        order.total_minor, order.currency, order.shipping_address
    ));

    EmailMessage {
        to: to.to_string(),
        subject: format!("Order confirmation {}", order.id),
        body,
    }
}
