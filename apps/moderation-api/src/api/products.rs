//! Products API routes and their backend wiring.

use axum::Router;
use database::common::RetryConfig;
use domain_products::{ListCache, RedisProductCache, handlers};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    handlers::router(state.products.clone())
}

/// `/cart`, `/selecteditem/{id}` and `/rejectitem/{id}` for the old dashboard.
pub fn legacy_router(state: &AppState) -> Router {
    handlers::legacy_router(state.products.clone())
}

/// Connect the list cache, or run without one.
///
/// An unset `REDIS_URL` leaves the cache disabled and the list is read from
/// MongoDB on every request. A Redis that is down at startup is connected
/// lazily, so it is picked up once it comes back.
pub async fn connect_cache(config: &Config) -> ListCache {
    let Some(redis) = config.redis.as_ref() else {
        info!("REDIS_URL not set, product list caching disabled");
        return ListCache::disabled(config.cache.clone());
    };

    let retry = RetryConfig::new().with_max_retries(2);
    let connected = database::redis::connect_from_config_with_retry(redis, Some(retry)).await;
    let backend = match connected {
        Ok(conn) => RedisProductCache::new(conn),
        Err(e) => match RedisProductCache::connect_lazily(redis.url()) {
            Ok(lazy) => {
                warn!(error = %e, "Redis unavailable, will connect on first cache use");
                lazy
            }
            Err(invalid) => {
                warn!(error = %invalid, "Invalid Redis URL, product list caching disabled");
                return ListCache::disabled(config.cache.clone());
            }
        },
    };

    info!(
        key = %config.cache.key,
        ttl_secs = config.cache.ttl.as_secs(),
        invalidation = %config.cache.invalidation,
        "Product list cache enabled"
    );
    ListCache::new(Arc::new(backend), config.cache.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_redis(url: &str) -> Config {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("marketplace")),
                ("REDIS_URL", Some(url)),
                ("REDIS_CONNECT_TIMEOUT_MS", Some("200")),
            ],
            || Config::from_env().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_redis_down_at_startup_keeps_cache_enabled() {
        let cache = connect_cache(&config_with_redis("redis://127.0.0.1:1/")).await;
        assert!(cache.is_enabled());
        assert_eq!(cache.read().await, None);
    }

    #[tokio::test]
    async fn test_malformed_redis_url_disables_cache() {
        let cache = connect_cache(&config_with_redis("not a redis url")).await;
        assert!(!cache.is_enabled());
    }
}
