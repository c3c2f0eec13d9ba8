use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::currency::RateTable;
use common::database::{DatabaseConfig, init_pool};

use api::middleware::TokenVerifier;
use api::repositories::{ApartmentRepository, OfferRepository};
use api::routes;
use api::state::{AppState, OfferPolicy};
use api::storage::HttpFileStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // The verifier only needs the issuer's public key; tokens are checked
    // locally with no call back to the auth service
    let token_verifier = TokenVerifier::from_env()?;

    let apartment_repository = ApartmentRepository::new(pool.clone());
    let offer_repository = OfferRepository::new(pool.clone());
    let offer_policy = OfferPolicy::from_env();
    let file_storage = Arc::new(HttpFileStorage::from_env());

    let app_state = AppState {
        db_pool: pool,
        apartment_repository,
        offer_repository,
        token_verifier,
        offer_policy,
        rate_table: RateTable::with_defaults(),
        file_storage,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
    info!("API service listening on 0.0.0.0:3001");

    axum::serve(listener, app).await?;

    Ok(())
}
