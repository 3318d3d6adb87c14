// Main entry point for the API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::domains::auth::JwtService;
use server_core::kernel::{self, ServerDeps, SmsGateAdapter};
use server_core::server::build_app;
use server_core::Config;
use smsgate::{SmsGateOptions, SmsGateService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Civic Connect API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Select the storage backend: Postgres, or the in-process fallback when
    // the database is unreachable.
    let stores = kernel::store::connect(&config.database_url).await;
    tracing::info!(backend = %stores.backend, "Storage ready");

    // Delivery transport (demo gateway - logs outbound messages)
    let gateway = Arc::new(SmsGateService::new(SmsGateOptions::default()));
    let delivery = Arc::new(SmsGateAdapter::new(gateway));

    // Session token service
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let deps = Arc::new(ServerDeps::new(stores, delivery, jwt_service));

    // Background sweep for expired OTP challenges
    let _scheduler = kernel::sweep::start_scheduler(deps.otps.clone())
        .await
        .context("Failed to start scheduler")?;

    // Build application
    let app = build_app(deps, &config.frontend_url);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/api/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
