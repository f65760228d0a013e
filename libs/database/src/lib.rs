//! Connection management for the document store (MongoDB) and the cache (Redis).
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB client construction, retry, health checks
//! - `redis` (default) - Redis `ConnectionManager` construction, retry, health checks
//! - `config` - `core_config::FromEnv` implementations for the config structs
//!
//! # Examples
//!
//! ## MongoDB
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "marketplace");
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let products = client.database(config.database()).collection::<Document>("products");
//! ```
//!
//! ## Redis
//!
//! ```ignore
//! use database::redis::{RedisConfig, connect_from_config};
//! use redis::AsyncCommands;
//!
//! let mut conn = connect_from_config(&RedisConfig::new("redis://127.0.0.1:6379")).await?;
//! conn.set_ex::<_, _, ()>("products", "[]", 3600).await?;
//! ```

pub mod common;

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
