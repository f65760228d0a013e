use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use mongodb::bson::oid::ObjectId;
use mongodb::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product {0} not found")]
    NotFound(ObjectId),

    /// The document store could not be reached (selection timeout, I/O, DNS).
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Search index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    /// Transient backend failures; `NotFound` never is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProductError::StoreUnavailable(_) | ProductError::IndexUnavailable(_)
        )
    }
}

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => {
                AppError::NotFound(format!("Product {} not found", id.to_hex()))
            }
            ProductError::StoreUnavailable(msg) => {
                AppError::InternalServerError(format!("document store unavailable: {}", msg))
            }
            ProductError::Database(msg) => AppError::InternalServerError(msg),
            ProductError::IndexUnavailable(msg) => {
                AppError::InternalServerError(format!("search index unavailable: {}", msg))
            }
            ProductError::Serialization(e) => AppError::SerdeJson(e),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. } => ProductError::StoreUnavailable(err.to_string()),
            _ => ProductError::Database(err.to_string()),
        }
    }
}
