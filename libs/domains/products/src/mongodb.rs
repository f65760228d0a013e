//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::{instrument, warn};

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, SelectionState};
use crate::repository::ProductRepository;

pub const DEFAULT_COLLECTION: &str = "products";

/// Numeric fields older clients may have written as `Decimal128`.
const NUMERIC_FIELDS: [&str; 3] = ["product_mrp", "offer", "quantity"];

pub struct MongoProductRepository {
    collection: Collection<Product>,
    documents: Collection<Document>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEFAULT_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        let documents = collection.clone_with_type::<Document>();
        Self {
            collection,
            documents,
        }
    }

    /// Index the selection flag so the stats counts stay cheap.
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "selected": 1 })
            .options(
                IndexOptions::builder()
                    .name("idx_selected".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(index).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Filter matching `state`, including legacy flag encodings.
    fn state_filter(state: SelectionState) -> Document {
        let mut accepted: Vec<Bson> = SelectionState::ACCEPTED_FLAGS
            .iter()
            .map(|flag| Bson::String(flag.to_string()))
            .collect();
        accepted.push(Bson::Int32(1));
        accepted.push(Bson::Int64(1));
        accepted.push(Bson::Boolean(true));

        match state {
            SelectionState::Accepted => doc! { "selected": { "$in": accepted } },
            // `$nin` also matches documents without the field
            SelectionState::Pending => doc! { "selected": { "$nin": accepted } },
        }
    }
}

/// Decode a stored document, reading `Decimal128` amounts through their text form.
pub(crate) fn decode_product(mut document: Document) -> Result<Product, bson::de::Error> {
    for field in NUMERIC_FIELDS {
        let text = match document.get(field) {
            Some(Bson::Decimal128(value)) => value.to_string(),
            _ => continue,
        };
        document.insert(field, text);
    }
    bson::from_document(document)
}

/// Decode every document, skipping the ones that no longer fit the model.
fn decode_all(documents: Vec<Document>) -> Vec<Product> {
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.get("_id").cloned();
            match decode_product(document) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(id = ?id, error = %e, "Skipping unreadable product document");
                    None
                }
            }
        })
        .collect()
}

fn decode_one(id: ObjectId, document: Document) -> ProductResult<Product> {
    decode_product(document).map_err(|e| {
        ProductError::Database(format!("product {} is unreadable: {}", id.to_hex(), e))
    })
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> ProductResult<Vec<Product>> {
        let cursor = self.documents.find(doc! {}).sort(doc! { "_id": 1 }).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        let stored = documents.len();
        let products = decode_all(documents);

        tracing::debug!(count = products.len(), stored, "Listed products from store");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>> {
        self.documents
            .find_one(doc! { "_id": id })
            .await?
            .map(|document| decode_one(id, document))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn set_selected(&self, id: ObjectId, state: SelectionState) -> ProductResult<Product> {
        let document = self
            .documents
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "selected": state.as_ref() } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(ProductError::NotFound(id))?;
        let product = decode_one(id, document)?;

        tracing::info!(product_id = %id, state = %state, "Product selection updated");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> ProductResult<()> {
        let result = self.documents.delete_one(doc! { "_id": id }).await?;

        if result.deleted_count == 0 {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_by_state(&self, state: SelectionState) -> ProductResult<u64> {
        let count = self
            .documents
            .count_documents(Self::state_filter(state))
            .await?;
        Ok(count)
    }
}
