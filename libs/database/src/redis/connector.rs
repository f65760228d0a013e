use redis::Client;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::info;

use super::RedisConfig;
use crate::common::{DatabaseError, RetryConfig, retry, retry_with_backoff};

/// Open a reconnecting [`ConnectionManager`] and verify it with `PING`.
///
/// The whole handshake is bounded by `config.connect_timeout_ms`.
///
/// ```ignore
/// use database::redis::{RedisConfig, connect_from_config};
///
/// let conn = connect_from_config(&RedisConfig::new("redis://127.0.0.1:6379")).await?;
/// ```
pub async fn connect_from_config(config: &RedisConfig) -> Result<ConnectionManager, DatabaseError> {
    info!("Attempting to connect to Redis at {}", config.url);

    let timeout = Duration::from_millis(config.connect_timeout_ms);
    let handshake = async {
        let client = Client::open(config.url.as_str())?;
        let mut manager = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut manager).await?;
        Ok::<_, redis::RedisError>(manager)
    };

    let manager = tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| {
            DatabaseError::ConnectionFailed(format!(
                "Redis did not answer within {}ms",
                config.connect_timeout_ms
            ))
        })??;

    info!("Successfully connected to Redis");
    Ok(manager)
}

/// [`connect_from_config`] with exponential backoff; `None` uses the default policy.
pub async fn connect_from_config_with_retry(
    config: &RedisConfig,
    retry_config: Option<RetryConfig>,
) -> Result<ConnectionManager, DatabaseError> {
    match retry_config {
        Some(policy) => retry_with_backoff(|| connect_from_config(config), policy).await,
        None => retry(|| connect_from_config(config)).await,
    }
}
