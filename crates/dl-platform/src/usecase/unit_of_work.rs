//! Unit of Work
//!
//! Atomic commit of aggregate changes, the domain event and the audit log.
//!
//! **This is the ONLY way to create a successful `UseCaseResult`.**
//! `UseCaseResult::success()` is crate-private, so a use case returns
//! success by committing:
//!
//! ```ignore
//! let vehicle = Vehicle::new(...);
//! let event = VehicleCreated::new(&ctx, &vehicle);
//! self.unit_of_work.commit(&vehicle, event, &command).await
//! ```
//!
//! Versioned aggregates are written optimistically: the commit carries the
//! version the use case read, stores `version + 1`, and fails with a
//! `ConcurrencyError` when another commit got there first.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use mongodb::error::TRANSIENT_TRANSACTION_ERROR;
use mongodb::{Client, ClientSession, Database};
use serde::Serialize;
use tracing::{debug, error};

use super::domain_event::DomainEvent;
use super::error::UseCaseError;
use super::result::UseCaseResult;
use crate::audit::entity::{AuditLog, StoredEvent};
use crate::store::mongo::is_duplicate_key;
use crate::store::InMemoryStore;

/// Entities persisted in their own collection under a string `_id`.
pub trait HasId {
    fn id(&self) -> &str;
    fn collection_name() -> &'static str;

    /// Version as read from the store; `None` opts out of the stale-write check.
    fn version(&self) -> Option<i64> {
        None
    }
}

/// Object-safe view of an aggregate, for multi-aggregate commits.
pub trait SerializableAggregate: Send + Sync {
    fn aggregate_id(&self) -> &str;
    fn aggregate_collection(&self) -> &'static str;
    fn aggregate_version(&self) -> Option<i64>;
    fn to_document(&self) -> Result<Document, bson::ser::Error>;
}

impl<T> SerializableAggregate for T
where
    T: HasId + Serialize + Send + Sync,
{
    fn aggregate_id(&self) -> &str {
        self.id()
    }

    fn aggregate_collection(&self) -> &'static str {
        T::collection_name()
    }

    fn aggregate_version(&self) -> Option<i64> {
        self.version()
    }

    fn to_document(&self) -> Result<Document, bson::ser::Error> {
        bson::to_document(self)
    }
}

/// A single write inside a commit.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Replace the whole document, inserting it if absent. With an
    /// `expected_version` the stored version must still match (a missing
    /// document counts as version 0).
    Upsert {
        collection: &'static str,
        id: String,
        document: Document,
        expected_version: Option<i64>,
    },
    Delete {
        collection: &'static str,
        id: String,
        expected_version: Option<i64>,
    },
}

/// Version stamped on a stored document; documents written before
/// versioning count as 0.
pub fn stored_version(document: &Document) -> i64 {
    match document.get("version") {
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Int32(v)) => i64::from(*v),
        _ => 0,
    }
}

pub(crate) fn concurrent_modification(collection: &str, id: &str) -> UseCaseError {
    UseCaseError::concurrency(
        "CONCURRENT_MODIFICATION",
        format!("{} '{}' was modified by another request, retry", collection, id),
    )
}

/// Everything one commit writes, serialized up front so that applying it
/// cannot fail half-way on encoding.
#[derive(Debug, Clone)]
pub struct CommitBatch {
    pub writes: Vec<WriteOp>,
    pub event: Document,
    pub audit_log: Document,
    pub event_id: String,
    pub event_type: String,
}

impl CommitBatch {
    fn build<E, C>(writes: Vec<WriteOp>, event: &E, command: &C) -> Result<Self, UseCaseError>
    where
        E: DomainEvent,
        C: Serialize,
    {
        let stored = StoredEvent::from_event(event);
        let audit = AuditLog::from_command(event, command);
        Ok(Self {
            writes,
            event: bson::to_document(&stored)
                .map_err(|e| UseCaseError::commit(format!("Failed to serialize event: {}", e)))?,
            audit_log: bson::to_document(&audit)
                .map_err(|e| UseCaseError::commit(format!("Failed to serialize audit log: {}", e)))?,
            event_id: event.event_id().to_string(),
            event_type: event.event_type().to_string(),
        })
    }
}

fn upsert_op(aggregate: &dyn SerializableAggregate) -> Result<WriteOp, UseCaseError> {
    let mut document = aggregate
        .to_document()
        .map_err(|e| UseCaseError::commit(format!("Failed to serialize aggregate: {}", e)))?;
    let expected_version = aggregate.aggregate_version();
    if let Some(version) = expected_version {
        document.insert("version", version + 1);
    }
    Ok(WriteOp::Upsert {
        collection: aggregate.aggregate_collection(),
        id: aggregate.aggregate_id().to_string(),
        document,
        expected_version,
    })
}

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Apply every write of the batch atomically, or none of them.
    async fn apply(&self, batch: CommitBatch) -> Result<(), UseCaseError>;

    /// Persist one aggregate with its event and audit log.
    async fn commit<E, T, C>(&self, aggregate: &T, event: E, command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Serialize + HasId + Send + Sync,
        C: Serialize + Send + Sync,
    {
        let prepared = upsert_op(aggregate).and_then(|op| CommitBatch::build(vec![op], &event, command));
        self.finish(prepared, event).await
    }

    /// Delete one aggregate with its event and audit log.
    async fn commit_delete<E, T, C>(&self, aggregate: &T, event: E, command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Serialize + HasId + Send + Sync,
        C: Serialize + Send + Sync,
    {
        let op = WriteOp::Delete {
            collection: T::collection_name(),
            id: aggregate.id().to_string(),
            expected_version: aggregate.version(),
        };
        let prepared = CommitBatch::build(vec![op], &event, command);
        self.finish(prepared, event).await
    }

    /// Persist several aggregates under a single event, e.g. a sales order
    /// together with the vehicle it reserves.
    async fn commit_all<E, C>(
        &self,
        aggregates: Vec<Box<dyn SerializableAggregate>>,
        event: E,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        C: Serialize + Send + Sync,
    {
        let prepared = aggregates
            .iter()
            .map(|a| upsert_op(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|ops| CommitBatch::build(ops, &event, command));
        self.finish(prepared, event).await
    }

    #[doc(hidden)]
    async fn finish<E>(&self, prepared: Result<CommitBatch, UseCaseError>, event: E) -> UseCaseResult<E>
    where
        E: DomainEvent + Send + 'static,
    {
        let batch = match prepared {
            Ok(batch) => batch,
            Err(e) => return UseCaseResult::failure(e),
        };
        let write_count = batch.writes.len();
        match self.apply(batch).await {
            Ok(()) => {
                debug!(
                    event_id = event.event_id(),
                    event_type = event.event_type(),
                    write_count,
                    "Committed unit of work"
                );
                UseCaseResult::success(event)
            }
            Err(e) => {
                error!(event_type = event.event_type(), error = %e, "Unit of work failed");
                UseCaseResult::failure(e)
            }
        }
    }
}

/// MongoDB implementation using multi-document transactions.
///
/// Requires a replica set deployment (MongoDB 4.0+).
#[derive(Clone)]
pub struct MongoUnitOfWork {
    client: Client,
    database: Database,
}

impl MongoUnitOfWork {
    pub fn new(client: Client, database: Database) -> Self {
        Self { client, database }
    }
}

fn version_filter(id: &str, expected_version: Option<i64>) -> Document {
    match expected_version {
        None => doc! { "_id": id },
        Some(0) => doc! {
            "_id": id,
            "$or": [ { "version": 0 }, { "version": { "$exists": false } } ],
        },
        Some(version) => doc! { "_id": id, "version": version },
    }
}

fn mongo_failure(e: mongodb::error::Error, collection: &str, id: &str) -> UseCaseError {
    if is_duplicate_key(&e) || e.contains_label(TRANSIENT_TRANSACTION_ERROR) {
        concurrent_modification(collection, id)
    } else {
        UseCaseError::commit(format!("Failed to persist {} '{}': {}", collection, id, e))
    }
}

impl MongoUnitOfWork {
    async fn write(&self, write: &WriteOp, session: &mut ClientSession) -> Result<(), UseCaseError> {
        match write {
            WriteOp::Upsert {
                collection,
                id,
                document,
                expected_version,
            } => {
                // A first write (version 0) may insert; a later one must match
                // an existing document. A version 0 upsert that loses the race
                // collides on `_id` and surfaces as a duplicate key.
                let result = self
                    .database
                    .collection::<Document>(collection)
                    .replace_one(version_filter(id, *expected_version), document)
                    .upsert(matches!(expected_version, None | Some(0)))
                    .session(&mut *session)
                    .await
                    .map_err(|e| mongo_failure(e, collection, id))?;
                if expected_version.is_some() && result.matched_count == 0 && result.upserted_id.is_none() {
                    return Err(concurrent_modification(collection, id));
                }
                Ok(())
            }
            WriteOp::Delete {
                collection,
                id,
                expected_version,
            } => {
                let result = self
                    .database
                    .collection::<Document>(collection)
                    .delete_one(version_filter(id, *expected_version))
                    .session(&mut *session)
                    .await
                    .map_err(|e| mongo_failure(e, collection, id))?;
                if expected_version.is_some() && result.deleted_count == 0 {
                    return Err(concurrent_modification(collection, id));
                }
                Ok(())
            }
        }
    }

    async fn write_all(&self, batch: &CommitBatch, session: &mut ClientSession) -> Result<(), UseCaseError> {
        for write in &batch.writes {
            self.write(write, session).await?;
        }
        self.database
            .collection::<Document>(StoredEvent::collection_name())
            .insert_one(&batch.event)
            .session(&mut *session)
            .await
            .map_err(|e| UseCaseError::commit(format!("Failed to insert event: {}", e)))?;
        self.database
            .collection::<Document>(AuditLog::collection_name())
            .insert_one(&batch.audit_log)
            .session(&mut *session)
            .await
            .map_err(|e| UseCaseError::commit(format!("Failed to insert audit log: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MongoUnitOfWork {
    async fn apply(&self, batch: CommitBatch) -> Result<(), UseCaseError> {
        let mut session = self.client.start_session().await.map_err(|e| {
            error!("Failed to start MongoDB session: {}", e);
            UseCaseError::commit(format!("Failed to start session: {}", e))
        })?;

        session
            .start_transaction()
            .await
            .map_err(|e| UseCaseError::commit(format!("Failed to start transaction: {}", e)))?;

        if let Err(e) = self.write_all(&batch, &mut session).await {
            let _ = session.abort_transaction().await;
            error!(event_id = %batch.event_id, error = %e, "Transaction aborted");
            return Err(e);
        }

        session.commit_transaction().await.map_err(|e| {
            if e.contains_label(TRANSIENT_TRANSACTION_ERROR) {
                UseCaseError::concurrency(
                    "CONCURRENT_MODIFICATION",
                    format!("Transaction conflicted with another request, retry: {}", e),
                )
            } else {
                UseCaseError::commit(format!("Failed to commit transaction: {}", e))
            }
        })
    }
}

/// Unit of work over the in-memory store; a batch is applied under the
/// store's write lock so readers never observe part of it.
#[derive(Clone)]
pub struct InMemoryUnitOfWork {
    store: Arc<InMemoryStore>,
}

impl InMemoryUnitOfWork {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn apply(&self, batch: CommitBatch) -> Result<(), UseCaseError> {
        self.store.apply_batch(batch)
    }
}
