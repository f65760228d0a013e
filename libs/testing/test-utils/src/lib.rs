//! Shared test utilities for domain testing
//!
//! - `TestMongo`: MongoDB container with a per-test database (feature: "mongo")
//! - `TestRedis`: Redis container with a reconnecting connection (feature: "redis")
//! - `TestDataBuilder`: deterministic ids and names (always available)
//!
//! Container-backed tests need Docker; mark them `#[ignore]`.
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["mongo", "redis"] }
//! ```
//!
//! ```rust,ignore
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! #[ignore] // Requires Docker
//! async fn my_mongo_test() {
//!     let builder = TestDataBuilder::from_test_name("my_mongo_test");
//!     let mongo = TestMongo::new(&builder.database_name()).await;
//!     let products = mongo.database().collection::<mongodb::bson::Document>("products");
//! }
//! ```

use mongodb::bson::oid::ObjectId;

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "mongo")]
pub use self::mongo::TestMongo;

#[cfg(feature = "redis")]
pub use self::redis::TestRedis;

/// Deterministic test data derived from a seed, so failures reproduce.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name; the recommended constructor.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_accept_product");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// The `n`th ObjectId for this seed.
    pub fn product_id(&self, n: u32) -> ObjectId {
        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&self.seed.to_be_bytes());
        bytes[8..].copy_from_slice(&n.to_be_bytes());
        ObjectId::from_bytes(bytes)
    }

    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.name("product", "mug"), "test-product-7-mug");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Database name unique to this seed, valid for MongoDB.
    pub fn database_name(&self) -> String {
        format!("test_{:x}", self.seed)
    }
}
