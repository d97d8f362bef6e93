use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use marquee_api::{app, AppState, AuthConfig};
use marquee_core::payment::GatewayConfig;
use marquee_store::app_config::Config;
use marquee_store::{DbClient, PgBookingRepository, PgCatalogRepository, PgSeatLedger, PgUserDirectory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,marquee_core=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    // Gateway secrets are validated once here, never per request
    let gateway = GatewayConfig::new(
        config.gateway.merchant_key.clone(),
        config.gateway.merchant_salt.expose().clone(),
        config.gateway.base_url.clone(),
        config.app.base_url.clone(),
        config.app.frontend_base_url.clone(),
    )?
    .with_product_info(config.gateway.product_info.clone())
    .with_phone(config.gateway.default_phone.clone());

    // Postgres
    let db = DbClient::new(config.database.url.expose(), config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let app_state = AppState::new(
        Arc::new(PgSeatLedger::new(db.pool.clone())),
        Arc::new(PgBookingRepository::new(db.pool.clone())),
        Arc::new(PgCatalogRepository::new(db.pool.clone())),
        Arc::new(PgUserDirectory::new(db.pool.clone())),
        gateway,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    )
    .with_allowed_origins(config.app.allowed_origins.clone());

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
