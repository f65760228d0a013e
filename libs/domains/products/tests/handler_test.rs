//! Handler tests for the Products domain
//!
//! These drive the routers with in-memory collaborators, so they run
//! without Docker:
//! - status codes and error bodies
//! - the `x-cache` header on the product list
//! - cache invalidation after accept and reject
//! - the legacy dashboard routes, including the `/cart` list alias

use ::mongodb::bson::oid::ObjectId;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use domain_products::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt; // For oneshot()

/// Shared in-memory product collection that counts list reads.
#[derive(Clone, Default)]
struct InMemoryRepository {
    products: Arc<Mutex<Vec<Product>>>,
    list_calls: Arc<AtomicUsize>,
}

impl InMemoryRepository {
    fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(Mutex::new(products)),
            list_calls: Arc::default(),
        }
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn len(&self) -> usize {
        self.products.lock().unwrap().len()
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepository {
    async fn list(&self) -> ProductResult<Vec<Product>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.lock().unwrap().clone())
    }

    async fn get_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn set_selected(&self, id: ObjectId, state: SelectionState) -> ProductResult<Product> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ProductError::NotFound(id))?;
        product.selected = state;
        Ok(product.clone())
    }

    async fn delete(&self, id: ObjectId) -> ProductResult<()> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(ProductError::NotFound(id));
        }
        Ok(())
    }

    async fn count_by_state(&self, state: SelectionState) -> ProductResult<u64> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.selected == state)
            .count() as u64)
    }
}

/// Search index that returns fixed hits, or is down.
#[derive(Clone)]
enum FixedSearch {
    Hits(Vec<Product>),
    Down,
}

#[async_trait]
impl SearchIndex for FixedSearch {
    async fn search(&self, _query: &str) -> ProductResult<Vec<Product>> {
        match self {
            FixedSearch::Hits(products) => Ok(products.clone()),
            FixedSearch::Down => Err(ProductError::IndexUnavailable(
                "connection refused".to_string(),
            )),
        }
    }

    async fn ping(&self) -> ProductResult<()> {
        match self {
            FixedSearch::Hits(_) => Ok(()),
            FixedSearch::Down => Err(ProductError::IndexUnavailable(
                "connection refused".to_string(),
            )),
        }
    }
}

fn sample_products() -> Vec<Product> {
    let mut mug = Product::new("Ceramic mug", 100.0, 25.0, 4);
    mug.image_url = Some("https://cdn.example.com/mug.png".to_string());
    let lamp = Product::new("Desk lamp", 40.0, 0.0, 1);
    vec![mug, lamp]
}

fn cached(invalidation: InvalidationPolicy) -> ListCache {
    ListCache::new(
        Arc::new(InMemoryProductCache::new()),
        CacheConfig {
            invalidation,
            ..CacheConfig::default()
        },
    )
}

/// `/products` and the legacy routes over one shared service state.
fn app(repo: InMemoryRepository, search: FixedSearch, cache: ListCache) -> Router {
    let service = ProductService::new(repo, search, cache);
    Router::new()
        .nest("/products", handlers::router(service.clone()))
        .merge(handlers::legacy_router(service))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn x_cache(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_products_miss_then_hit() {
    let repo = InMemoryRepository::with_products(sample_products());
    let app = app(
        repo.clone(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let first = app.clone().oneshot(get("/products")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first), "MISS");
    assert_eq!(
        first.headers().get("content-type").unwrap(),
        "application/json"
    );
    let first_body = first.into_body().collect().await.unwrap().to_bytes();

    let second = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(x_cache(&second), "HIT");
    let second_body = second.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(first_body, second_body);
    assert_eq!(repo.list_calls(), 1);

    let views: Vec<ProductView> = serde_json::from_slice(&first_body).unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].selling_price, 75.0);
    assert_eq!(
        views[0].image.as_deref(),
        Some("https://cdn.example.com/mug.png")
    );
}

#[tokio::test]
async fn test_list_products_without_cache_always_misses() {
    let repo = InMemoryRepository::with_products(sample_products());
    let app = app(
        repo.clone(),
        FixedSearch::Hits(vec![]),
        ListCache::disabled(CacheConfig::default()),
    );

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/products")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(x_cache(&response), "MISS");
    }
    assert_eq!(repo.list_calls(), 2);
}

#[tokio::test]
async fn test_empty_collection_lists_as_empty_array() {
    let app = app(
        InMemoryRepository::default(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let response = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Vec<Value> = json_body(response.into_body()).await;
    assert!(body.is_empty());
}

// ============================================================================
// Single product and stats
// ============================================================================

#[tokio::test]
async fn test_get_product_returns_200() {
    let products = sample_products();
    let id = products[1].id;
    let app = app(
        InMemoryRepository::with_products(products),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let response = app
        .oneshot(get(&format!("/products/{}", id.to_hex())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view: ProductView = json_body(response.into_body()).await;
    assert_eq!(view.id, id.to_hex());
    assert_eq!(view.name, "Desk lamp");
    assert_eq!(view.selling_price, 40.0);
    assert_eq!(view.selected, SelectionState::Pending);
}

#[tokio::test]
async fn test_get_missing_product_returns_404_body() {
    let app = app(
        InMemoryRepository::default(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );
    let id = ObjectId::new();

    let response = app
        .oneshot(get(&format!("/products/{}", id.to_hex())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["code"], 1004);
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(
        body["message"],
        format!("Product {} not found", id.to_hex())
    );
}

#[tokio::test]
async fn test_malformed_id_returns_400() {
    let app = app(
        InMemoryRepository::with_products(sample_products()),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let response = app
        .clone()
        .oneshot(get("/products/not-an-object-id"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_OBJECT_ID");

    let response = app.oneshot(delete("/products/12345")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_counts_by_state() {
    let mut products = sample_products();
    products[0].selected = SelectionState::Accepted;
    let app = app(
        InMemoryRepository::with_products(products),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let response = app.oneshot(get("/products/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats: ModerationStats = json_body(response.into_body()).await;
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.total, 2);
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_returns_index_hits() {
    let hits = sample_products();
    let app = app(
        InMemoryRepository::default(),
        FixedSearch::Hits(hits.clone()),
        cached(InvalidationPolicy::Evict),
    );

    let response = app.oneshot(get("/products/search?q=mug")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let views: Vec<ProductView> = json_body(response.into_body()).await;
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].id, hits[0].id.to_hex());
}

#[tokio::test]
async fn test_search_with_index_down_returns_empty_200() {
    let app = app(
        InMemoryRepository::with_products(sample_products()),
        FixedSearch::Down,
        cached(InvalidationPolicy::Evict),
    );

    let response = app.oneshot(get("/products/search?q=mug")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let views: Vec<Value> = json_body(response.into_body()).await;
    assert!(views.is_empty());
}

// ============================================================================
// Moderation
// ============================================================================

#[tokio::test]
async fn test_select_product_accepts_and_evicts_list() {
    let products = sample_products();
    let id = products[0].id;
    let repo = InMemoryRepository::with_products(products);
    let app = app(
        repo.clone(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let warm = app.clone().oneshot(get("/products")).await.unwrap();
    assert_eq!(x_cache(&warm), "MISS");

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/products/{}/select", id.to_hex()),
            json!({ "selected": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view: ProductView = json_body(response.into_body()).await;
    assert_eq!(view.selected, SelectionState::Accepted);

    let after = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(x_cache(&after), "MISS");
    let views: Vec<ProductView> = json_body(after.into_body()).await;
    assert_eq!(views[0].selected, SelectionState::Accepted);
    assert_eq!(repo.list_calls(), 2);
}

#[tokio::test]
async fn test_select_with_ttl_policy_keeps_cached_list() {
    let products = sample_products();
    let id = products[0].id;
    let app = app(
        InMemoryRepository::with_products(products),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Ttl),
    );

    app.clone().oneshot(get("/products")).await.unwrap();

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/products/{}/select", id.to_hex()),
            json!({ "selected": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(x_cache(&after), "HIT");
    let views: Vec<ProductView> = json_body(after.into_body()).await;
    assert_eq!(views[0].selected, SelectionState::Pending);
}

#[tokio::test]
async fn test_select_false_is_rejected_with_400() {
    let products = sample_products();
    let id = products[0].id;
    let repo = InMemoryRepository::with_products(products);
    let app = app(
        repo.clone(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let response = app
        .oneshot(put_json(
            &format!("/products/{}/select", id.to_hex()),
            json!({ "selected": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let stored = repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.selected, SelectionState::Pending);
}

#[tokio::test]
async fn test_select_missing_product_returns_404() {
    let app = app(
        InMemoryRepository::with_products(sample_products()),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let response = app
        .oneshot(put_json(
            &format!("/products/{}/select", ObjectId::new().to_hex()),
            json!({ "selected": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reject_product_returns_204_then_404() {
    let products = sample_products();
    let id = products[1].id;
    let repo = InMemoryRepository::with_products(products);
    let app = app(
        repo.clone(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );
    let uri = format!("/products/{}", id.to_hex());

    let response = app.clone().oneshot(delete(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
    assert_eq!(repo.len(), 1);

    let again = app.clone().oneshot(delete(&uri)).await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let gone = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rejected_product_disappears_from_list() {
    let products = sample_products();
    let id = products[0].id;
    let app = app(
        InMemoryRepository::with_products(products),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    app.clone().oneshot(get("/products")).await.unwrap();
    app.clone()
        .oneshot(delete(&format!("/products/{}", id.to_hex())))
        .await
        .unwrap();

    let response = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(x_cache(&response), "MISS");
    let views: Vec<ProductView> = json_body(response.into_body()).await;
    assert!(views.iter().all(|v| v.id != id.to_hex()));
}

// ============================================================================
// Legacy dashboard routes
// ============================================================================

#[tokio::test]
async fn test_legacy_cart_shares_the_list_cache() {
    let repo = InMemoryRepository::with_products(sample_products());
    let app = app(
        repo.clone(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let first = app.clone().oneshot(get("/cart")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first), "MISS");
    let first_body = first.into_body().collect().await.unwrap().to_bytes();

    let second = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(x_cache(&second), "HIT");
    let second_body = second.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(first_body, second_body);
    assert_eq!(repo.list_calls(), 1);
}

#[tokio::test]
async fn test_legacy_select_accepts_string_flag() {
    let products = sample_products();
    let id = products[0].id;
    let repo = InMemoryRepository::with_products(products);
    let app = app(
        repo.clone(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let response = app
        .oneshot(put_json(
            &format!("/selecteditem/{}", id.to_hex()),
            json!({ "selected": "1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.selected, SelectionState::Accepted);
}

#[tokio::test]
async fn test_legacy_reject_deletes() {
    let products = sample_products();
    let id = products[0].id;
    let repo = InMemoryRepository::with_products(products);
    let app = app(
        repo.clone(),
        FixedSearch::Hits(vec![]),
        cached(InvalidationPolicy::Evict),
    );

    let response = app
        .clone()
        .oneshot(delete(&format!("/rejectitem/{}", id.to_hex())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(repo.len(), 1);

    let missing = app
        .oneshot(delete(&format!("/rejectitem/{}", id.to_hex())))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
