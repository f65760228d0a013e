//! Cache-aside storage for the product list.
//!
//! [`ProductCache`] is the raw backend. [`ListCache`] owns the single list
//! key, its TTL and the failure policy: every backend problem is logged and
//! then behaves like a miss.

use async_trait::async_trait;
use core_config::{env_or_default, env_parse, ConfigError, FromEnv};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// What happens to the cached list after a product is accepted or rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InvalidationPolicy {
    /// Drop the entry after every successful mutation
    #[default]
    Evict,
    /// Leave the entry alone; readers see the old list until the TTL runs out
    Ttl,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub key: String,
    pub ttl: Duration,
    /// Upper bound for a single cache round trip
    pub op_timeout: Duration,
    pub invalidation: InvalidationPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: "products".to_string(),
            ttl: Duration::from_secs(3600),
            op_timeout: Duration::from_millis(250),
            invalidation: InvalidationPolicy::Evict,
        }
    }
}

/// Environment variables:
/// - `CACHE_KEY` (default: `products`)
/// - `CACHE_TTL_SECS` (default: 3600)
/// - `CACHE_TIMEOUT_MS` (default: 250)
/// - `CACHE_INVALIDATION`: `evict` or `ttl` (default: `evict`)
impl FromEnv for CacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs: u64 = env_parse("CACHE_TTL_SECS", "3600")?;
        if ttl_secs == 0 {
            return Err(ConfigError::ParseError {
                key: "CACHE_TTL_SECS".to_string(),
                details: "TTL must be at least one second".to_string(),
            });
        }

        Ok(Self {
            key: env_or_default("CACHE_KEY", "products"),
            ttl: Duration::from_secs(ttl_secs),
            op_timeout: Duration::from_millis(env_parse("CACHE_TIMEOUT_MS", "250")?),
            invalidation: env_parse("CACHE_INVALIDATION", "evict")?,
        })
    }
}

/// Key/value backend with per-entry expiry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCache: Send + Sync {
    /// `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn evict(&self, key: &str) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

/// Redis backend using `SET EX`, `GET` and `DEL`.
///
/// Built from a live [`ConnectionManager`], or lazily from a client when Redis
/// was not reachable at startup. A lazy cache connects on first use and keeps
/// retrying on later operations until a connection succeeds.
#[derive(Clone)]
pub struct RedisProductCache {
    client: Option<redis::Client>,
    conn: Arc<OnceCell<ConnectionManager>>,
}

impl RedisProductCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            client: None,
            conn: Arc::new(OnceCell::new_with(Some(conn))),
        }
    }

    /// Validate `url` now, connect later.
    pub fn connect_lazily(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client: Some(client),
            conn: Arc::new(OnceCell::new()),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let client = self
                    .client
                    .clone()
                    .ok_or_else(|| CacheError::Backend("no Redis client configured".into()))?;
                let conn = ConnectionManager::new(client).await?;
                tracing::info!("Connected to Redis");
                Ok::<_, CacheError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl ProductCache for RedisProductCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, payload, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Process-local backend. Expiry follows the tokio clock, so paused-time
/// tests can step over the TTL.
#[derive(Default)]
pub struct InMemoryProductCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl InMemoryProductCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductCache for InMemoryProductCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(payload, _)| payload.clone()))
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (payload.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// The cached product list: one key, one TTL, failures treated as misses.
#[derive(Clone)]
pub struct ListCache {
    backend: Option<Arc<dyn ProductCache>>,
    config: CacheConfig,
}

impl ListCache {
    pub fn new(backend: Arc<dyn ProductCache>, config: CacheConfig) -> Self {
        Self {
            backend: Some(backend),
            config,
        }
    }

    /// Every read misses and writes are dropped.
    pub fn disabled(config: CacheConfig) -> Self {
        Self {
            backend: None,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.config.op_timeout, op)
            .await
            .map_err(|_| CacheError::Timeout(self.config.op_timeout))?
    }

    /// The cached payload, or `None` on miss, expiry, error or timeout.
    pub async fn read(&self) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match self.bounded(backend.get(&self.config.key)).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(
                    key = %self.config.key,
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                None
            }
        }
    }

    /// Store `payload` with a fresh TTL. Failures are logged only.
    pub async fn store(&self, payload: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match self
            .bounded(backend.set(&self.config.key, payload, self.config.ttl))
            .await
        {
            Ok(()) => tracing::debug!(
                key = %self.config.key,
                ttl_secs = self.config.ttl.as_secs(),
                "Product list cached"
            ),
            Err(e) => {
                tracing::warn!(key = %self.config.key, error = %e, "Failed to cache product list")
            }
        }
    }

    /// Drop the entry. Failures are logged only.
    pub async fn evict(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match self.bounded(backend.evict(&self.config.key)).await {
            Ok(()) => tracing::debug!(key = %self.config.key, "Product list evicted"),
            Err(e) => {
                tracing::warn!(key = %self.config.key, error = %e, "Failed to evict product list")
            }
        }
    }

    /// `None` when the cache is disabled.
    pub async fn ping(&self) -> Option<Result<(), CacheError>> {
        let backend = self.backend.as_ref()?;
        Some(self.bounded(backend.ping()).await)
    }
}
