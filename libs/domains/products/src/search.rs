//! Search index adapter backed by a Solr core.
//!
//! The index mirrors the product collection and may lag behind it.
//! Moderation never writes to it.

use async_trait::async_trait;
use core_config::{env_or_default, env_parse, ConfigError, FromEnv};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::Product;

/// What an empty or whitespace-only query returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EmptyQueryPolicy {
    /// Return nothing without calling the index
    #[default]
    Empty,
    /// Send `*:*` and return the index's default ranking
    MatchAll,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Solr core URL, e.g. `http://solr-server:8983/solr/products`
    pub url: String,
    pub rows: u32,
    pub timeout: Duration,
    pub empty_query: EmptyQueryPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8983/solr/products".to_string(),
            rows: 50,
            timeout: Duration::from_millis(2000),
            empty_query: EmptyQueryPolicy::Empty,
        }
    }
}

/// Environment variables:
/// - `SEARCH_URL` (default: `http://localhost:8983/solr/products`)
/// - `SEARCH_ROWS` (default: 50)
/// - `SEARCH_TIMEOUT_MS` (default: 2000)
/// - `SEARCH_EMPTY_QUERY`: `empty` or `match_all` (default: `empty`)
impl FromEnv for SearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_or_default("SEARCH_URL", "http://localhost:8983/solr/products"),
            rows: env_parse("SEARCH_ROWS", "50")?,
            timeout: Duration::from_millis(env_parse("SEARCH_TIMEOUT_MS", "2000")?),
            empty_query: env_parse("SEARCH_EMPTY_QUERY", "empty")?,
        })
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Products matching `query`, in index relevance order.
    ///
    /// Fails with `IndexUnavailable` on connection failure, timeout or a non-2xx answer.
    async fn search(&self, query: &str) -> ProductResult<Vec<Product>>;

    /// Cheap reachability probe for readiness checks.
    async fn ping(&self) -> ProductResult<()>;
}

pub struct SolrSearchIndex {
    client: reqwest::Client,
    config: SearchConfig,
}

#[derive(Deserialize)]
struct SolrSelect {
    response: SolrDocs,
}

#[derive(Deserialize)]
struct SolrDocs {
    #[serde(default)]
    docs: Vec<Map<String, Value>>,
}

impl SolrSearchIndex {
    pub fn new(config: SearchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn select_url(&self) -> String {
        format!("{}/select", self.config.url.trim_end_matches('/'))
    }

    async fn select(&self, q: &str, rows: u32) -> ProductResult<Vec<Map<String, Value>>> {
        let response = self
            .client
            .get(self.select_url())
            .query(&[("q", q), ("rows", &rows.to_string()), ("wt", "json")])
            .send()
            .await
            .map_err(|e| ProductError::IndexUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProductError::IndexUnavailable(format!(
                "search index answered {}",
                status
            )));
        }

        let body: SolrSelect = response
            .json()
            .await
            .map_err(|e| ProductError::IndexUnavailable(format!("unreadable response: {}", e)))?;

        Ok(body.response.docs)
    }
}

/// Turn a Solr document into a product, or `None` if it cannot be read.
///
/// Multi-valued fields holding one value are flattened and the id may be
/// indexed as `id` or `_id`.
fn product_from_doc(doc: Map<String, Value>) -> Option<Product> {
    let mut fields: Map<String, Value> = doc
        .into_iter()
        .filter_map(|(key, value)| match value {
            _ if key == "product_images" => value.is_array().then_some((key, value)),
            Value::Array(mut values) if values.len() == 1 => Some((key, values.remove(0))),
            other => Some((key, other)),
        })
        .collect();

    let raw_id = fields
        .remove("id")
        .or_else(|| fields.remove("_id"))
        .and_then(|v| v.as_str().map(str::to_string))?;
    let id = match ObjectId::parse_str(&raw_id) {
        Ok(id) => id,
        Err(_) => {
            tracing::debug!(id = %raw_id, "Skipping indexed document with non-ObjectId id");
            return None;
        }
    };

    // Extended JSON, the only string form bson's ObjectId deserializer takes
    fields.insert("_id".to_string(), serde_json::json!({ "$oid": id.to_hex() }));

    match serde_json::from_value::<Product>(Value::Object(fields)) {
        Ok(product) => Some(product),
        Err(e) => {
            tracing::debug!(id = %raw_id, error = %e, "Skipping unreadable indexed document");
            None
        }
    }
}

#[async_trait]
impl SearchIndex for SolrSearchIndex {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> ProductResult<Vec<Product>> {
        let query = query.trim();
        let q = if query.is_empty() {
            match self.config.empty_query {
                EmptyQueryPolicy::Empty => return Ok(Vec::new()),
                EmptyQueryPolicy::MatchAll => "*:*",
            }
        } else {
            query
        };

        let docs = self.select(q, self.config.rows).await?;
        let total = docs.len();
        let products: Vec<Product> = docs.into_iter().filter_map(product_from_doc).collect();

        tracing::debug!(total, readable = products.len(), "Search index answered");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> ProductResult<()> {
        self.select("*:*", 0).await.map(|_| ())
    }
}
