//! Product moderation service: cache-aside listing, search, accept and reject.

use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::instrument;

use crate::cache::{InvalidationPolicy, ListCache};
use crate::error::{ProductError, ProductResult};
use crate::models::{ModerationStats, ProductView, SelectionState};
use crate::repository::ProductRepository;
use crate::search::SearchIndex;

/// Where a list payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Serialized `Vec<ProductView>`, passed through verbatim on cache hits.
#[derive(Debug, Clone)]
pub struct CachedList {
    pub payload: String,
    pub status: CacheStatus,
}

pub struct ProductService<R: ProductRepository, S: SearchIndex> {
    repository: Arc<R>,
    search: Arc<S>,
    cache: ListCache,
}

impl<R: ProductRepository, S: SearchIndex> ProductService<R, S> {
    pub fn new(repository: R, search: S, cache: ListCache) -> Self {
        Self {
            repository: Arc::new(repository),
            search: Arc::new(search),
            cache,
        }
    }

    pub fn cache(&self) -> &ListCache {
        &self.cache
    }

    pub fn search_index(&self) -> &S {
        &self.search
    }

    /// The full product list, served from cache when possible.
    ///
    /// A hit returns the stored bytes untouched and never touches the store.
    /// A miss reads the store once and repopulates the entry.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ProductResult<CachedList> {
        if let Some(payload) = self.cache.read().await {
            tracing::debug!("Product list served from cache");
            return Ok(CachedList {
                payload,
                status: CacheStatus::Hit,
            });
        }

        let products = self.repository.list().await?;
        let views: Vec<ProductView> = products.iter().map(ProductView::from).collect();
        let payload = serde_json::to_string(&views)?;

        self.cache.store(&payload).await;

        Ok(CachedList {
            payload,
            status: CacheStatus::Miss,
        })
    }

    /// Search the index; an unreachable index yields no results.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> ProductResult<Vec<ProductView>> {
        match self.search.search(query).await {
            Ok(products) => Ok(products.iter().map(ProductView::from).collect()),
            Err(ProductError::IndexUnavailable(reason)) => {
                tracing::warn!(%reason, "Search index unavailable, returning no results");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ObjectId) -> ProductResult<ProductView> {
        self.repository
            .get_by_id(id)
            .await?
            .map(ProductView::from)
            .ok_or(ProductError::NotFound(id))
    }

    /// Mark a product accepted. Accepting twice is a no-op.
    #[instrument(skip(self))]
    pub async fn accept(&self, id: ObjectId) -> ProductResult<ProductView> {
        let product = self
            .repository
            .set_selected(id, SelectionState::Accepted)
            .await?;

        self.invalidate().await;
        tracing::info!(product_id = %id, "Product accepted");
        Ok(ProductView::from(product))
    }

    /// Delete a rejected product.
    #[instrument(skip(self))]
    pub async fn reject(&self, id: ObjectId) -> ProductResult<()> {
        self.repository.delete(id).await?;

        self.invalidate().await;
        tracing::info!(product_id = %id, "Product rejected");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn moderation_stats(&self) -> ProductResult<ModerationStats> {
        let (pending, accepted) = futures::try_join!(
            self.repository.count_by_state(SelectionState::Pending),
            self.repository.count_by_state(SelectionState::Accepted),
        )?;

        Ok(ModerationStats {
            pending,
            accepted,
            total: pending + accepted,
        })
    }

    async fn invalidate(&self) {
        match self.cache.config().invalidation {
            InvalidationPolicy::Evict => self.cache.evict().await,
            InvalidationPolicy::Ttl => {}
        }
    }
}

impl<R: ProductRepository, S: SearchIndex> Clone for ProductService<R, S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            search: Arc::clone(&self.search),
            cache: self.cache.clone(),
        }
    }
}
