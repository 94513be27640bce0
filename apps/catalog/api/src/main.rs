use axum_helpers::server::create_production_app;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{
    InMemoryProductRepository, MongoProductRepository, ProductRepository, ProductService,
};
use std::future::Future;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;

use config::{Config, StoreKind};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    match config.store {
        StoreKind::Mongo => {
            let mongo = config
                .mongo
                .clone()
                .ok_or_else(|| eyre::eyre!("MongoDB settings missing for the mongo store"))?;
            info!(database = mongo.database(), "Connecting to MongoDB");
            let client = database::mongodb::connect_from_config_with_retry(&mongo, None)
                .await
                .map_err(|e| eyre::eyre!("MongoDB connection failed: {}", e))?;

            let repository = MongoProductRepository::new(&client.database(mongo.database()));
            repository
                .init_indexes()
                .await
                .map_err(|e| eyre::eyre!("Failed to create product indexes: {}", e))?;

            serve(ProductService::new(repository), &config, async move {
                info!("Shutting down: closing MongoDB client");
                client.shutdown().await;
                info!("MongoDB client closed");
            })
            .await?;
        }
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory product store; data is lost on restart");
            serve(
                ProductService::new(InMemoryProductRepository::new()),
                &config,
                async {},
            )
            .await?;
        }
    }

    info!("Catalog API shutdown complete");
    Ok(())
}

/// Build the app around `service` and run it until a shutdown signal.
async fn serve<R, F>(service: ProductService<R>, config: &Config, cleanup: F) -> eyre::Result<()>
where
    R: ProductRepository + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = api::app(service, config.app, config.cors_allowed_origin.as_deref())?;

    info!(
        "Starting {} v{} with graceful shutdown ({:?} timeout)",
        config.app.name, config.app.version, SHUTDOWN_TIMEOUT
    );

    create_production_app(app, &config.server, SHUTDOWN_TIMEOUT, cleanup)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))
}
