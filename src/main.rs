use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::signal;
use tracing::info;

use storefront_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db = api::db::establish_connection(&cfg)
        .await
        .context("failed to connect to database")?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db)
            .await
            .context("schema bootstrap failed")?;
    }
    let db = Arc::new(db);

    let (event_sender, event_rx) = api::events::channel(1024);
    tokio::spawn(api::events::process_events(event_rx));

    let auth = Arc::new(api::auth::AuthService::new(
        &cfg.jwt_secret,
        cfg.jwt_expiration,
    ));

    let gateway: Arc<dyn api::gateway::PaymentGateway> =
        Arc::new(api::gateway::HttpPaymentGateway::new(
            cfg.gateway_base_url.clone(),
            cfg.gateway_key_id.clone(),
            cfg.gateway_key_secret.clone(),
            Duration::from_secs(cfg.gateway_timeout_secs),
        )?);

    let notifier: Arc<dyn api::notifications::Notifier> =
        match (cfg.email_api_url.clone(), cfg.email_api_key.clone()) {
            (Some(url), Some(key)) => Arc::new(api::notifications::HttpEmailNotifier::new(
                url,
                key,
                cfg.email_from.clone(),
                Duration::from_secs(10),
            )?),
            _ => {
                info!("email provider not configured; order confirmations disabled");
                Arc::new(api::notifications::NoopNotifier)
            }
        };

    let settings = api::services::checkout::CheckoutSettings {
        currency: cfg.currency.clone(),
        signature_secret: cfg.gateway_key_secret.clone(),
        total_tolerance_minor: cfg.order_total_tolerance_minor,
    };
    let services =
        api::handlers::AppServices::new(db.clone(), event_sender.clone(), gateway, notifier, settings);

    let state = Arc::new(api::AppState {
        db,
        config: cfg.clone(),
        auth,
        event_sender,
        services,
    });
    let app = api::app(state);

    let addr: SocketAddr = cfg
        .server_addr()
        .parse()
        .context("invalid listen address")?;
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown signal received");
}
