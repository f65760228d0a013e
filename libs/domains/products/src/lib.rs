//! Products Domain
//!
//! Moderation of marketplace products stored in MongoDB, with a cache-aside
//! product list and search through an external Solr index.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │   Service   │ ──▶ │  ListCache  │  ← Redis or in-memory
//! └──┬───────┬──┘     └─────────────┘
//!    │       │
//! ┌──▼───┐ ┌─▼──────────┐
//! │ Repo │ │ SearchIndex│  ← MongoDB / Solr
//! └──────┘ └────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     cache::{CacheConfig, ListCache},
//!     handlers,
//!     mongodb::MongoProductRepository,
//!     search::{SearchConfig, SolrSearchIndex},
//!     service::ProductService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("marketplace");
//!
//! let service = ProductService::new(
//!     MongoProductRepository::new(&db),
//!     SolrSearchIndex::new(SearchConfig::default())?,
//!     ListCache::disabled(CacheConfig::default()),
//! );
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod search;
pub mod service;

pub use self::mongodb::MongoProductRepository;
pub use cache::{
    CacheConfig, CacheError, InMemoryProductCache, InvalidationPolicy, ListCache, ProductCache,
    RedisProductCache,
};
pub use error::{ProductError, ProductResult};
pub use handlers::{ApiDoc, LegacyApiDoc};
pub use models::{ModerationStats, Product, ProductView, SelectProduct, SelectionState};
pub use repository::ProductRepository;
pub use search::{EmptyQueryPolicy, SearchConfig, SearchIndex, SolrSearchIndex};
pub use service::{CacheStatus, CachedList, ProductService};
