//! Document Store
//!
//! Persistence seam for every repository. Aggregates are stored as BSON
//! documents keyed by a string `_id`; queries use the MongoDB filter
//! language. Two engines implement it:
//!
//! - `MongoStore` - MongoDB collections
//! - `InMemoryStore` - process-local maps evaluating a subset of the
//!   filter language, used by tests and `storage.backend = "memory"`

pub mod collection;
pub mod filter;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::Document;

use crate::shared::error::Result;

pub use collection::{Page, TypedCollection};
pub use memory::InMemoryStore;
pub use mongo::MongoStore;

/// Options for `DocumentStore::find`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Mongo-style sort spec, e.g. `{ "createdAt": -1 }`
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl FindOptions {
    pub fn sorted(sort: Document) -> Self {
        Self {
            sort: Some(sort),
            ..Default::default()
        }
    }

    pub fn paged(mut self, skip: u64, limit: i64) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; fails with `Duplicate` if the `_id` exists.
    async fn insert(&self, collection: &str, document: Document) -> Result<()>;

    /// Replace the document with this id, inserting it if absent.
    async fn replace(&self, collection: &str, id: &str, document: Document) -> Result<()>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>>;

    async fn find(&self, collection: &str, filter: Document, options: FindOptions) -> Result<Vec<Document>>;

    async fn count(&self, collection: &str, filter: Document) -> Result<u64>;

    /// Apply `$set` with the given fields to every matching document.
    async fn update_many(&self, collection: &str, filter: Document, set: Document) -> Result<u64>;

    /// Cheap liveness check used by the readiness probe.
    async fn ping(&self) -> Result<()>;
}
