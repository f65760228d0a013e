use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use core_config::AppInfo;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// A boxed future for health checks with a string error
pub type HealthCheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// One dependency probed by the readiness endpoint.
pub struct ReadinessCheck<'a> {
    name: &'a str,
    required: bool,
    check: Option<HealthCheckFuture<'a>>,
}

impl<'a> ReadinessCheck<'a> {
    /// A failing required check makes the service not ready (503).
    pub fn required(name: &'a str, check: HealthCheckFuture<'a>) -> Self {
        Self {
            name,
            required: true,
            check: Some(check),
        }
    }

    /// A failing optional check is reported but the service stays ready.
    pub fn optional(name: &'a str, check: HealthCheckFuture<'a>) -> Self {
        Self {
            name,
            required: false,
            check: Some(check),
        }
    }

    /// A dependency that is not configured at all.
    pub fn disabled(name: &'a str) -> Self {
        Self {
            name,
            required: false,
            check: None,
        }
    }
}

/// Run every check concurrently and fold the results into one readiness payload.
///
/// Each dependency is reported as `connected`, `disconnected` or `disabled`.
/// Overall status is `ready`, `degraded` (only optional checks failed) or
/// `not ready` (a required check failed, answered with 503).
///
/// ```ignore
/// run_health_checks(vec![
///     ReadinessCheck::required("database", Box::pin(async {
///         check_mongo(&db).await.map_err(|e| e.to_string())
///     })),
///     ReadinessCheck::disabled("cache"),
/// ])
/// .await
/// ```
pub async fn run_health_checks(
    checks: Vec<ReadinessCheck<'_>>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let mut meta = Vec::with_capacity(checks.len());
    let mut futures = Vec::new();
    for check in checks {
        meta.push((check.name, check.required, check.check.is_some()));
        if let Some(fut) = check.check {
            futures.push(fut);
        }
    }
    let mut results = join_all(futures).await.into_iter();

    let mut services = Map::new();
    let mut required_failed = false;
    let mut optional_failed = false;

    for (name, required, enabled) in meta {
        if !enabled {
            services.insert(name.to_string(), json!("disabled"));
            continue;
        }

        match results.next() {
            Some(Ok(())) => {
                services.insert(name.to_string(), json!("connected"));
            }
            Some(Err(e)) => {
                if required {
                    tracing::error!("Readiness check failed: {} error: {}", name, e);
                    required_failed = true;
                } else {
                    tracing::warn!("Optional dependency unavailable: {} error: {}", name, e);
                    optional_failed = true;
                }
                services.insert(name.to_string(), json!("disconnected"));
            }
            None => {}
        }
    }

    let status = if required_failed {
        "not ready"
    } else if optional_failed {
        "degraded"
    } else {
        "ready"
    };

    let mut response = Map::new();
    response.insert("status".to_string(), json!(status));
    response.extend(services);
    let response = Value::Object(response);

    if required_failed {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    } else {
        Ok((StatusCode::OK, Json(response)))
    }
}

/// Liveness: always 200 while the process is serving.
pub async fn health_handler(State(app): State<AppInfo>) -> Response {
    let response = HealthResponse {
        status: "healthy",
        name: app.name,
        version: app.version,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Router with `GET /health`.
///
/// ```ignore
/// let app = router.merge(health_router(app_info!()));
/// ```
pub fn health_router(app_info: AppInfo) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(app_info)
}
