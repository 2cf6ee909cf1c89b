//! Audit Log and Event Repositories
//!
//! Both collections are written only by the unit of work; these are the
//! read sides.

use std::sync::Arc;

use bson::{doc, Document};

use super::entity::{AuditLog, StoredEvent};
use crate::shared::error::Result;
use crate::store::{DocumentStore, Page, TypedCollection};
use crate::usecase::HasId;

#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub principal_id: Option<String>,
    pub operation: Option<String>,
}

impl AuditLogFilter {
    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(ref entity_type) = self.entity_type {
            filter.insert("entityType", entity_type.as_str());
        }
        if let Some(ref entity_id) = self.entity_id {
            filter.insert("entityId", entity_id.as_str());
        }
        if let Some(ref principal_id) = self.principal_id {
            filter.insert("principalId", principal_id.as_str());
        }
        if let Some(ref operation) = self.operation {
            filter.insert("operation", operation.as_str());
        }
        filter
    }
}

pub struct AuditLogRepository {
    collection: TypedCollection<AuditLog>,
}

impl AuditLogRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, AuditLog::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<AuditLog>> {
        self.collection.find_by_id(id).await
    }

    /// Newest first.
    pub async fn search(&self, filter: &AuditLogFilter, page: u32, size: u32) -> Result<Page<AuditLog>> {
        self.collection
            .find_page(filter.to_document(), doc! { "performedAt": -1 }, page, size)
            .await
    }
}

pub struct EventRepository {
    collection: TypedCollection<StoredEvent>,
}

impl EventRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, StoredEvent::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<StoredEvent>> {
        self.collection.find_by_id(id).await
    }

    /// Events for one aggregate (`domain.aggregate.id`), oldest first.
    pub async fn find_by_subject(&self, subject: &str, page: u32, size: u32) -> Result<Page<StoredEvent>> {
        self.collection
            .find_page(doc! { "subject": subject }, doc! { "time": 1 }, page, size)
            .await
    }

    pub async fn find_by_correlation(&self, correlation_id: &str, page: u32, size: u32) -> Result<Page<StoredEvent>> {
        self.collection
            .find_page(doc! { "correlationId": correlation_id }, doc! { "time": 1 }, page, size)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, Memory};
    use crate::usecase::UnitOfWork;
    use crate::vehicle::entity::{Vehicle, VehicleCondition};
    use crate::vehicle::operations::VehicleCreated;

    #[derive(serde::Serialize)]
    struct AddVehicleCommand {
        vin: String,
    }

    #[tokio::test]
    async fn test_commit_is_readable_through_both_repositories() {
        let mem = Memory::new();
        let logs = AuditLogRepository::new(mem.dyn_store());
        let events = EventRepository::new(mem.dyn_store());

        let vehicle = Vehicle::new("2T1BURHE0JC074587", "Toyota", "Corolla", 2021, VehicleCondition::Used, 2_000_000);
        let event = VehicleCreated::new(&ctx(), &vehicle);
        let command = AddVehicleCommand { vin: vehicle.vin.clone() };
        let committed = mem.uow.commit(&vehicle, event, &command).await.unwrap();

        let by_vehicle = AuditLogFilter {
            entity_id: Some(vehicle.id.clone()),
            ..Default::default()
        };
        let page = logs.search(&by_vehicle, 0, 20).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].operation, "AddVehicleCommand");
        assert_eq!(page.items[0].principal_id.as_deref(), Some("staff-1"));

        let by_staff = AuditLogFilter {
            principal_id: Some("someone-else".into()),
            ..Default::default()
        };
        assert_eq!(logs.search(&by_staff, 0, 20).await.unwrap().total, 0);

        let stream = events
            .find_by_subject(&committed.metadata.subject, 0, 20)
            .await
            .unwrap();
        assert_eq!(stream.items.len(), 1);
        assert_eq!(stream.items[0].id, committed.metadata.event_id);
    }
}
