//! Shared harness: application state over an in-memory SQLite database with
//! a stub payment gateway and a recording notifier.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::{
    app,
    auth::AuthService,
    config::AppConfig,
    db,
    entities::product,
    errors::ServiceError,
    events,
    gateway::{GatewayOrder, PaymentGateway},
    handlers::AppServices,
    notifications::{EmailMessage, Notifier},
    services::{catalog::CreateProductInput, checkout::CheckoutSettings},
    AppState,
};

pub const TEST_GATEWAY_SECRET: &str = "test_gateway_secret";
pub const TEST_JWT_SECRET: &str = "test_jwt_secret_for_integration_tests";

/// Gateway stub that mints deterministic orders without touching the network.
pub struct StubGateway;

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, ServiceError> {
        Ok(GatewayOrder {
            gateway_order_id: format!("order_{}", Uuid::new_v4().simple()),
            amount_minor,
            currency: currency.to_string(),
        })
    }

    fn key_id(&self) -> &str {
        "key_test"
    }
}

/// Gateway stub whose order creation always fails.
pub struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    async fn create_order(
        &self,
        _amount_minor: i64,
        _currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, ServiceError> {
        Err(ServiceError::UpstreamGatewayFailure(
            "gateway unavailable".to_string(),
        ))
    }

    fn key_id(&self) -> &str {
        "key_test"
    }
}

/// Notifier that records every message it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), ServiceError> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway(Arc::new(StubGateway)).await
    }

    pub async fn with_gateway(gateway: Arc<dyn PaymentGateway>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:",
            TEST_JWT_SECRET,
            "key_test",
            TEST_GATEWAY_SECRET,
            "127.0.0.1",
            0,
            "test",
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let conn = db::establish_connection(&cfg).await.expect("database");
        db::run_migrations(&conn).await.expect("schema bootstrap");
        let conn = Arc::new(conn);

        let (event_sender, event_rx) = events::channel(64);
        tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(&cfg.jwt_secret, cfg.jwt_expiration));
        let notifier = Arc::new(RecordingNotifier::default());

        let settings = CheckoutSettings {
            currency: cfg.currency.clone(),
            signature_secret: cfg.gateway_key_secret.clone(),
            total_tolerance_minor: cfg.order_total_tolerance_minor,
        };
        let services = AppServices::new(
            conn.clone(),
            event_sender.clone(),
            gateway,
            notifier.clone(),
            settings,
        );

        let state = Arc::new(AppState {
            db: conn,
            config: cfg,
            auth,
            event_sender,
            services,
        });
        let router = app(state.clone());

        TestApp {
            router,
            state,
            notifier,
        }
    }

    pub fn user_token(&self) -> String {
        self.state
            .auth
            .issue_token("user-1", Some("shopper@example.com"), &[])
            .expect("user token")
    }

    pub fn second_user_token(&self) -> String {
        self.state
            .auth
            .issue_token("user-2", Some("other@example.com"), &[])
            .expect("user token")
    }

    pub fn admin_token(&self) -> String {
        self.state
            .auth
            .issue_token("admin-1", Some("admin@example.com"), &["admin"])
            .expect("admin token")
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        price_minor: i64,
        stock: Option<i32>,
    ) -> product::Model {
        self.state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: String::new(),
                price_minor,
                stock,
            })
            .await
            .expect("seed product")
    }

    pub async fn deactivate(&self, id: Uuid) -> product::Model {
        self.state
            .services
            .catalog
            .deactivate_product(id)
            .await
            .expect("deactivate product")
    }

    pub async fn stock_of(&self, id: Uuid) -> Option<i32> {
        self.state
            .services
            .catalog
            .get_product(id)
            .await
            .expect("product")
            .stock
    }

    pub async fn order_count(&self) -> u64 {
        use sea_orm::{EntityTrait, PaginatorTrait};
        storefront_api::entities::order::Entity::find()
            .count(&*self.state.db)
            .await
            .expect("order count")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Computes the signature a genuine gateway would attach to a payment claim.
pub fn gateway_signature(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    storefront_api::gateway::sign_payment(TEST_GATEWAY_SECRET, gateway_order_id, gateway_payment_id)
}
