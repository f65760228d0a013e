use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{MongoProductRepository, ProductService, SolrSearchIndex};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());

    let repository = MongoProductRepository::with_collection(&db, &config.collection);
    repository.init_indexes().await?;

    let cache = api::products::connect_cache(&config).await;

    let search = SolrSearchIndex::new(config.search.clone())?;
    info!(url = %config.search.url, "Search index configured");

    let state = AppState {
        products: ProductService::new(repository, search, cache),
        config,
        mongo_client,
        db,
    };

    let api_routes = api::routes(&state);

    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    let app = router
        .merge(health_router(state.config.app))
        .merge(api::health::router(state.clone()));

    info!(
        "Starting moderation API with graceful shutdown ({}s timeout)",
        state.config.shutdown_timeout.as_secs()
    );

    let AppState {
        config, mongo_client, ..
    } = state;

    create_production_app(app, &config.server, config.shutdown_timeout, async move {
        info!("Shutting down: closing MongoDB connections");
        mongo_client.shutdown().await;
        info!("MongoDB connection closed successfully");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Moderation API shutdown complete");
    Ok(())
}
