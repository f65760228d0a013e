//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Moderation API",
        version = "0.1.0",
        description = "Accept or reject marketplace products, with a cached product list and Solr-backed search",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/products", api = domain_products::ApiDoc),
        (path = "/api", api = domain_products::LegacyApiDoc)
    ),
    tags(
        (name = "Products", description = "Product moderation endpoints")
    )
)]
pub struct ApiDoc;
