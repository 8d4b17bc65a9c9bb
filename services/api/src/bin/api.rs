//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, HttpProbeAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, AppState, LocalProfiles},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use biblio_core::ports::RemoteStore;
use biblio_core::LocatorParser;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Connects to the remote database once. Any failure leaves the remote store
/// unavailable for the lifetime of the process.
async fn connect_remote(config: &Config) -> Option<Arc<dyn RemoteStore>> {
    let Some(database_url) = &config.database_url else {
        info!("DATABASE_URL not set; using local storage only");
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Remote database unreachable, using local storage only: {}", e);
            return None;
        }
    };

    let db_adapter = DbAdapter::new(pool);
    info!("Running database migrations...");
    if let Err(e) = db_adapter.run_migrations().await {
        warn!("Database migrations failed, using local storage only: {}", e);
        return None;
    }
    info!("Database migrations complete.");
    Some(Arc::new(db_adapter))
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Establish Remote Availability ---
    let remote = connect_remote(&config).await;

    // --- 3. Initialize Service Adapters ---
    let probe = Arc::new(HttpProbeAdapter::new(config.probe_timeout)?);
    let locator = LocatorParser::new(config.locator_config()).with_probe(probe);
    info!("Local profiles stored under {:?}", config.local_store_dir);
    let profiles = LocalProfiles::Directory(config.local_store_dir.clone());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), locator, remote, profiles));

    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(api_lib::web::middleware::USER_ID_HEADER),
        ]);

    // --- 5. Create the Web Router ---
    let app = build_router(app_state).layer(cors);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
