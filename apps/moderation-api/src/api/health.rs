//! Readiness endpoint

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{ReadinessCheck, run_health_checks};
use domain_products::SearchIndex;

use crate::state::AppState;

/// Router with `GET /ready`, merged beside `/health`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// MongoDB must answer; the cache and the search index only degrade readiness.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.products.cache();
    let search = state.products.search_index();

    let cache_check = if cache.is_enabled() {
        ReadinessCheck::optional(
            "cache",
            Box::pin(async move {
                match cache.ping().await {
                    Some(Err(e)) => Err(e.to_string()),
                    _ => Ok(()),
                }
            }),
        )
    } else {
        ReadinessCheck::disabled("cache")
    };

    run_health_checks(vec![
        ReadinessCheck::required(
            "mongodb",
            Box::pin(async {
                database::mongodb::check_health(&state.db)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
        cache_check,
        ReadinessCheck::optional(
            "search",
            Box::pin(async move { search.ping().await.map_err(|e| e.to_string()) }),
        ),
    ])
    .await
}
