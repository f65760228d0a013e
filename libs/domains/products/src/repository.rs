use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::ProductResult;
use crate::models::{Product, SelectionState};

/// Data access for the moderation workflow.
///
/// Every method fails with `StoreUnavailable` when the store cannot be reached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products in insertion order
    async fn list(&self) -> ProductResult<Vec<Product>>;

    async fn get_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>>;

    /// Set the selection state and return the updated product.
    ///
    /// Re-applying the current state succeeds. Fails with `NotFound` for an unknown id.
    async fn set_selected(&self, id: ObjectId, state: SelectionState) -> ProductResult<Product>;

    /// Remove a product permanently. Fails with `NotFound` for an unknown id.
    async fn delete(&self, id: ObjectId) -> ProductResult<()>;

    async fn count_by_state(&self, state: SelectionState) -> ProductResult<u64>;
}
