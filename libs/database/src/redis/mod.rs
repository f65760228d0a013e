//! Redis connection management for the response cache.

mod config;
mod connector;

pub use config::RedisConfig;
pub use connector::{connect_from_config, connect_from_config_with_retry};

// Re-export redis types for convenience
pub use redis::aio::ConnectionManager;
pub use redis::{AsyncCommands, RedisError, RedisResult};
