//! MongoDB document store.

use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Collection, Database};

use super::{DocumentStore, FindOptions};
use crate::shared::error::{PlatformError, Result};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    /// Unique indexes backing the uniqueness rules of the domain.
    pub async fn ensure_indexes(&self) -> Result<()> {
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        let unique = [
            ("users", "email"),
            ("customers", "email"),
            ("vehicles", "vin"),
            ("vehicles", "stockNumber"),
            ("refresh_tokens", "tokenHash"),
        ];
        for (collection, field) in unique {
            let model = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection(collection).create_index(model).await?;
        }

        let lookups = [
            ("sales_orders", "customerId"),
            ("invoices", "customerId"),
            ("payments", "invoiceId"),
            ("appointments", "startAt"),
            ("events", "subject"),
            ("audit_logs", "entityId"),
            ("refresh_tokens", "tokenFamily"),
            ("waiting_list", "makeKey"),
        ];
        for (collection, field) in lookups {
            let model = IndexModel::builder().keys(doc! { field: 1 }).build();
            self.collection(collection).create_index(model).await?;
        }
        Ok(())
    }
}

pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<()> {
        let id = document.get("_id").map(|v| v.to_string()).unwrap_or_default();
        match self.collection(collection).insert_one(document).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(PlatformError::duplicate(collection, "_id", id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, collection: &str, id: &str, document: Document) -> Result<()> {
        self.collection(collection)
            .replace_one(doc! { "_id": id }, document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let result = self.collection(collection).delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self.collection(collection).find_one(doc! { "_id": id }).await?)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
        Ok(self.collection(collection).find_one(filter).await?)
    }

    async fn find(&self, collection: &str, filter: Document, options: FindOptions) -> Result<Vec<Document>> {
        let mut find_options = mongodb::options::FindOptions::default();
        find_options.sort = options.sort;
        find_options.skip = options.skip;
        find_options.limit = options.limit;

        let cursor = self
            .collection(collection)
            .find(filter)
            .with_options(find_options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, collection: &str, filter: Document) -> Result<u64> {
        Ok(self.collection(collection).count_documents(filter).await?)
    }

    async fn update_many(&self, collection: &str, filter: Document, set: Document) -> Result<u64> {
        let result = self
            .collection(collection)
            .update_many(filter, doc! { "$set": set })
            .await?;
        Ok(result.modified_count)
    }

    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
