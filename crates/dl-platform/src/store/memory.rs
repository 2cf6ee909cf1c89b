//! In-memory document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bson::{Bson, Document};
use parking_lot::RwLock;

use super::filter::{matches, sort_documents};
use super::{DocumentStore, FindOptions};
use crate::audit::entity::{AuditLog, StoredEvent};
use crate::shared::error::{PlatformError, Result};
use crate::usecase::unit_of_work::{concurrent_modification, stored_version};
use crate::usecase::{CommitBatch, HasId, UseCaseError, WriteOp};

type Collection = BTreeMap<String, Document>;

/// Process-local store. Collections are ordered by `_id`, so unsorted
/// finds return documents in TSID (creation) order.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

fn document_id(document: &Document) -> Result<String> {
    match document.get("_id") {
        Some(Bson::String(id)) => Ok(id.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(PlatformError::validation("Document has no _id")),
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a unit-of-work batch under a single write lock.
    ///
    /// Aggregate versions and the event and audit ids are all checked
    /// before anything is written, so a rejected batch leaves every
    /// collection untouched.
    pub fn apply_batch(&self, batch: CommitBatch) -> std::result::Result<(), UseCaseError> {
        let event_id = document_id(&batch.event).map_err(|e| UseCaseError::commit(e.to_string()))?;
        let audit_id = document_id(&batch.audit_log).map_err(|e| UseCaseError::commit(e.to_string()))?;

        let mut collections = self.collections.write();

        for write in &batch.writes {
            let (collection, id, expected) = match write {
                WriteOp::Upsert {
                    collection,
                    id,
                    expected_version: Some(expected),
                    ..
                } => (collection, id, *expected),
                WriteOp::Delete {
                    collection,
                    id,
                    expected_version: Some(expected),
                } => (collection, id, *expected),
                _ => continue,
            };
            let current = collections
                .get(*collection)
                .and_then(|c| c.get(id))
                .map(stored_version);
            let fresh = match (write, current) {
                (WriteOp::Upsert { .. }, None) => expected == 0,
                (WriteOp::Delete { .. }, None) => false,
                (_, Some(version)) => version == expected,
            };
            if !fresh {
                return Err(concurrent_modification(collection, id));
            }
        }

        let taken = |name: &str, id: &str| collections.get(name).map(|c| c.contains_key(id)).unwrap_or(false);
        if taken(StoredEvent::collection_name(), &event_id) {
            return Err(UseCaseError::commit(format!("Event '{}' already stored", event_id)));
        }
        if taken(AuditLog::collection_name(), &audit_id) {
            return Err(UseCaseError::commit(format!("Audit log '{}' already stored", audit_id)));
        }

        for write in batch.writes {
            match write {
                WriteOp::Upsert { collection, id, document, .. } => {
                    collections
                        .entry(collection.to_string())
                        .or_default()
                        .insert(id, document);
                }
                WriteOp::Delete { collection, id, .. } => {
                    if let Some(c) = collections.get_mut(collection) {
                        c.remove(&id);
                    }
                }
            }
        }

        collections
            .entry(StoredEvent::collection_name().to_string())
            .or_default()
            .insert(event_id, batch.event);
        collections
            .entry(AuditLog::collection_name().to_string())
            .or_default()
            .insert(audit_id, batch.audit_log);

        Ok(())
    }

    fn matching(&self, collection: &str, filter: &Document) -> Vec<Document> {
        let collections = self.collections.read();
        collections
            .get(collection)
            .map(|c| c.values().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<()> {
        let id = document_id(&document)?;
        let mut collections = self.collections.write();
        let target = collections.entry(collection.to_string()).or_default();
        if target.contains_key(&id) {
            return Err(PlatformError::duplicate(collection, "_id", id));
        }
        target.insert(id, document);
        Ok(())
    }

    async fn replace(&self, collection: &str, id: &str, mut document: Document) -> Result<()> {
        document.insert("_id", id);
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self
            .collections
            .write()
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .is_some())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|c| c.values().find(|d| matches(d, &filter)))
            .cloned())
    }

    async fn find(&self, collection: &str, filter: Document, options: FindOptions) -> Result<Vec<Document>> {
        let mut docs = self.matching(collection, &filter);
        if let Some(sort) = &options.sort {
            sort_documents(&mut docs, sort);
        }
        let skip = options.skip.unwrap_or(0) as usize;
        let docs = docs.into_iter().skip(skip);
        Ok(match options.limit {
            Some(limit) if limit > 0 => docs.take(limit as usize).collect(),
            _ => docs.collect(),
        })
    }

    async fn count(&self, collection: &str, filter: Document) -> Result<u64> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|c| c.values().filter(|d| matches(d, &filter)).count() as u64)
            .unwrap_or(0))
    }

    async fn update_many(&self, collection: &str, filter: Document, set: Document) -> Result<u64> {
        let mut collections = self.collections.write();
        let Some(target) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut modified = 0;
        for document in target.values_mut().filter(|d| matches(d, &filter)) {
            for (key, value) in set.iter() {
                document.insert(key.clone(), value.clone());
            }
            modified += 1;
        }
        Ok(modified)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        store.insert("customers", doc! { "_id": "C1", "email": "a@x.io" }).await.unwrap();
        let err = store
            .insert("customers", doc! { "_id": "C1", "email": "b@x.io" })
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_find_with_sort_skip_limit() {
        let store = InMemoryStore::new();
        for (id, price) in [("A", 300), ("B", 100), ("C", 200), ("D", 400)] {
            store
                .insert("vehicles", doc! { "_id": id, "priceCents": price, "status": "AVAILABLE" })
                .await
                .unwrap();
        }
        store
            .insert("vehicles", doc! { "_id": "E", "priceCents": 50, "status": "SOLD" })
            .await
            .unwrap();

        let options = FindOptions::sorted(doc! { "priceCents": 1 }).paged(1, 2);
        let found = store
            .find("vehicles", doc! { "status": "AVAILABLE" }, options)
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|d| d.get_str("_id").unwrap()).collect();
        assert_eq!(ids, vec!["C", "A"]);
        assert_eq!(store.count("vehicles", doc! { "status": "AVAILABLE" }).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_update_many_and_delete() {
        let store = InMemoryStore::new();
        store.insert("tokens", doc! { "_id": "1", "family": "f", "revoked": false }).await.unwrap();
        store.insert("tokens", doc! { "_id": "2", "family": "f", "revoked": false }).await.unwrap();
        store.insert("tokens", doc! { "_id": "3", "family": "g", "revoked": false }).await.unwrap();

        let n = store
            .update_many("tokens", doc! { "family": "f" }, doc! { "revoked": true })
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.count("tokens", doc! { "revoked": true }).await.unwrap(), 2);

        assert!(store.delete("tokens", "3").await.unwrap());
        assert!(!store.delete("tokens", "3").await.unwrap());
        assert!(store.find_by_id("tokens", "3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_apply_batch_rejects_replayed_event() {
        let store = InMemoryStore::new();
        let batch = CommitBatch {
            writes: vec![WriteOp::Upsert {
                collection: "vehicles",
                id: "V1".into(),
                document: doc! { "_id": "V1" },
                expected_version: None,
            }],
            event: doc! { "_id": "E1" },
            audit_log: doc! { "_id": "A1" },
            event_id: "E1".into(),
            event_type: "dealerline:inventory:vehicle:created".into(),
        };
        store.apply_batch(batch.clone()).unwrap();

        let mut replay = batch;
        replay.writes = vec![WriteOp::Delete {
            collection: "vehicles",
            id: "V1".into(),
            expected_version: None,
        }];
        replay.audit_log = doc! { "_id": "A2" };
        assert!(store.apply_batch(replay).is_err());
        assert!(store.find_by_id("vehicles", "V1").await.unwrap().is_some());
        assert_eq!(store.count("audit_logs", doc! {}).await.unwrap(), 1);
    }

    fn versioned_write(id: &str, version: i64, expected: i64, event: &str) -> CommitBatch {
        CommitBatch {
            writes: vec![WriteOp::Upsert {
                collection: "invoices",
                id: id.into(),
                document: doc! { "_id": id, "version": version },
                expected_version: Some(expected),
            }],
            event: doc! { "_id": event },
            audit_log: doc! { "_id": format!("audit-{}", event) },
            event_id: event.into(),
            event_type: "dealerline:billing:invoice:paid".into(),
        }
    }

    #[tokio::test]
    async fn test_apply_batch_rejects_stale_version() {
        let store = InMemoryStore::new();
        store.apply_batch(versioned_write("I1", 1, 0, "E1")).unwrap();
        store.apply_batch(versioned_write("I1", 2, 1, "E2")).unwrap();

        // A writer that read version 1 before E2 landed
        let err = store.apply_batch(versioned_write("I1", 2, 1, "E3")).unwrap_err();
        assert_eq!(err.code(), "CONCURRENT_MODIFICATION");
        assert_eq!(err.http_status_code(), 409);

        let stored = store.find_by_id("invoices", "I1").await.unwrap().unwrap();
        assert_eq!(stored_version(&stored), 2);
        assert_eq!(store.count("events", doc! {}).await.unwrap(), 2);
    }
}
