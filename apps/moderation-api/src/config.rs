use core_config::{AppInfo, FromEnv, app_info, env_or_default, env_parse, server::ServerConfig};
use database::mongodb::MongoConfig;
use database::redis::RedisConfig;
use domain_products::{CacheConfig, SearchConfig};
use std::time::Duration;

pub use core_config::Environment;

/// Application configuration, composed from the shared config components.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    /// Collection holding the products (`MONGODB_COLLECTION`, default `products`)
    pub collection: String,
    /// `None` when `REDIS_URL` is unset; the list is then never cached
    pub redis: Option<RedisConfig>,
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Bound on connection cleanup after the server stops (`SHUTDOWN_TIMEOUT_SECS`)
    pub shutdown_timeout: Duration,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            mongodb: MongoConfig::from_env()?,
            collection: env_or_default("MONGODB_COLLECTION", domain_products::mongodb::DEFAULT_COLLECTION),
            redis: RedisConfig::optional_from_env()?,
            cache: CacheConfig::from_env()?,
            search: SearchConfig::from_env()?,
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
            shutdown_timeout: Duration::from_secs(env_parse("SHUTDOWN_TIMEOUT_SECS", "30")?),
        })
    }
}
