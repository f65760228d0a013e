//! Application state management.

use domain_products::{MongoProductRepository, ProductService, SolrSearchIndex};
use mongodb::{Client, Database};

/// The product service as wired in production.
pub type Products = ProductService<MongoProductRepository, SolrSearchIndex>;

/// Shared application state; every field is a cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// MongoDB client (shares the underlying connection pool)
    pub mongo_client: Client,
    pub db: Database,
    pub products: Products,
}
