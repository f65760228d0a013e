//! API routes module

pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// All API routes; `axum_helpers::create_router` nests them under `/api`.
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/products", products::router(state))
        .merge(products::legacy_router(state))
}
