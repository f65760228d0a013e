//! HTTP handlers for the product moderation API

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestObjectIdResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse,
    },
    ObjectIdPath, ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{ModerationStats, ProductView, SelectProduct, SelectionState};
use crate::repository::ProductRepository;
use crate::search::SearchIndex;
use crate::service::ProductService;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        search_products,
        moderation_stats,
        get_product,
        select_product,
        reject_product,
    ),
    components(
        schemas(ProductView, SelectProduct, SelectionState, ModerationStats),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestObjectIdResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product moderation endpoints")
    )
)]
pub struct ApiDoc;

/// Routes kept for the original dashboard client.
#[derive(OpenApi)]
#[openapi(paths(legacy_cart, legacy_select_item, legacy_reject_item))]
pub struct LegacyApiDoc;

type SharedService<R, S> = Arc<ProductService<R, S>>;

/// Moderation routes, meant to be nested under `/products`.
pub fn router<R, S>(service: ProductService<R, S>) -> Router
where
    R: ProductRepository + 'static,
    S: SearchIndex + 'static,
{
    Router::new()
        .route("/", get(list_products))
        .route("/search", get(search_products))
        .route("/stats", get(moderation_stats))
        .route("/{id}", get(get_product).delete(reject_product))
        .route("/{id}/select", put(select_product))
        .with_state(Arc::new(service))
}

/// `GET /cart`, `PUT /selecteditem/{id}` and `DELETE /rejectitem/{id}`, mounted beside `/products`.
pub fn legacy_router<R, S>(service: ProductService<R, S>) -> Router
where
    R: ProductRepository + 'static,
    S: SearchIndex + 'static,
{
    Router::new()
        .route("/cart", get(legacy_cart))
        .route("/selecteditem/{id}", put(legacy_select_item))
        .route("/rejectitem/{id}", delete(legacy_reject_item))
        .with_state(Arc::new(service))
}

/// List all products (cache-aside)
///
/// The `x-cache` header tells whether the body came from the cache.
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    responses(
        (status = 200, description = "All products", body = Vec<ProductView>,
            headers(("x-cache" = String, description = "HIT or MISS"))),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository, S: SearchIndex>(
    State(service): State<SharedService<R, S>>,
) -> ProductResult<Response> {
    let list = service.list_products().await?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            (
                X_CACHE,
                HeaderValue::from_static(list.status.as_header_value()),
            ),
        ],
        list.payload,
    )
        .into_response())
}

/// Search query parameters
#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Free-text query passed to the search index
    #[serde(default)]
    pub q: String,
}

/// Search products through the search index
///
/// Returns an empty list when the index is unreachable.
#[utoipa::path(
    get,
    path = "/search",
    tag = "Products",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching products in relevance order", body = Vec<ProductView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: ProductRepository, S: SearchIndex>(
    State(service): State<SharedService<R, S>>,
    Query(query): Query<SearchQuery>,
) -> ProductResult<Json<Vec<ProductView>>> {
    let products = service.search_products(&query.q).await?;
    Ok(Json(products))
}

/// Pending and accepted counts
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Products",
    responses(
        (status = 200, description = "Moderation counts", body = ModerationStats),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn moderation_stats<R: ProductRepository, S: SearchIndex>(
    State(service): State<SharedService<R, S>>,
) -> ProductResult<Json<ModerationStats>> {
    let stats = service.moderation_stats().await?;
    Ok(Json(stats))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductView),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository, S: SearchIndex>(
    State(service): State<SharedService<R, S>>,
    ObjectIdPath(id): ObjectIdPath,
) -> ProductResult<Json<ProductView>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Accept a product
#[utoipa::path(
    put,
    path = "/{id}/select",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    request_body = SelectProduct,
    responses(
        (status = 200, description = "Product accepted", body = ProductView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn select_product<R: ProductRepository, S: SearchIndex>(
    State(service): State<SharedService<R, S>>,
    ObjectIdPath(id): ObjectIdPath,
    ValidatedJson(_body): ValidatedJson<SelectProduct>,
) -> ProductResult<Json<ProductView>> {
    let product = service.accept(id).await?;
    Ok(Json(product))
}

/// Reject (delete) a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    responses(
        (status = 204, description = "Product rejected and deleted"),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn reject_product<R: ProductRepository, S: SearchIndex>(
    State(service): State<SharedService<R, S>>,
    ObjectIdPath(id): ObjectIdPath,
) -> ProductResult<StatusCode> {
    service.reject(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List all products (legacy dashboard route, same cache as `/products`)
#[utoipa::path(
    get,
    path = "/cart",
    tag = "Products",
    responses(
        (status = 200, description = "All products", body = Vec<ProductView>,
            headers(("x-cache" = String, description = "HIT or MISS"))),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn legacy_cart<R: ProductRepository, S: SearchIndex>(
    state: State<SharedService<R, S>>,
) -> ProductResult<Response> {
    list_products(state).await
}

/// Accept a product (legacy dashboard route)
#[utoipa::path(
    put,
    path = "/selecteditem/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    request_body = SelectProduct,
    responses(
        (status = 200, description = "Product accepted", body = ProductView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn legacy_select_item<R: ProductRepository, S: SearchIndex>(
    state: State<SharedService<R, S>>,
    id: ObjectIdPath,
    body: ValidatedJson<SelectProduct>,
) -> ProductResult<Json<ProductView>> {
    select_product(state, id, body).await
}

/// Reject a product (legacy dashboard route)
#[utoipa::path(
    delete,
    path = "/rejectitem/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    responses(
        (status = 204, description = "Product rejected and deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn legacy_reject_item<R: ProductRepository, S: SearchIndex>(
    state: State<SharedService<R, S>>,
    id: ObjectIdPath,
) -> ProductResult<StatusCode> {
    reject_product(state, id).await
}
