//! Service Order Repository

use std::sync::Arc;

use bson::{doc, Document};

use super::entity::{ServiceOrder, ServiceOrderStatus};
use crate::shared::error::Result;
use crate::store::{DocumentStore, Page, TypedCollection};
use crate::usecase::HasId;

#[derive(Debug, Clone, Default)]
pub struct ServiceOrderFilter {
    pub status: Option<ServiceOrderStatus>,
    pub customer_id: Option<String>,
    pub technician_id: Option<String>,
}

impl ServiceOrderFilter {
    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        if let Some(ref customer_id) = self.customer_id {
            filter.insert("customerId", customer_id.as_str());
        }
        if let Some(ref technician_id) = self.technician_id {
            filter.insert("technicianId", technician_id.as_str());
        }
        filter
    }
}

pub struct ServiceOrderRepository {
    collection: TypedCollection<ServiceOrder>,
}

impl ServiceOrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, ServiceOrder::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ServiceOrder>> {
        self.collection.find_by_id(id).await
    }

    pub async fn search(&self, filter: &ServiceOrderFilter, page: u32, size: u32) -> Result<Page<ServiceOrder>> {
        self.collection
            .find_page(filter.to_document(), doc! { "createdAt": -1 }, page, size)
            .await
    }

    /// Open or in-progress orders for an inventory vehicle.
    pub async fn find_active_for_vehicle(&self, vehicle_id: &str) -> Result<Option<ServiceOrder>> {
        let active: Vec<&str> = ServiceOrderStatus::ACTIVE.iter().map(|s| s.as_str()).collect();
        self.collection
            .find_one(doc! { "vehicleId": vehicle_id, "status": { "$in": active } })
            .await
    }

    pub async fn count_active(&self) -> Result<u64> {
        let active: Vec<&str> = ServiceOrderStatus::ACTIVE.iter().map(|s| s.as_str()).collect();
        self.collection.count(doc! { "status": { "$in": active } }).await
    }
}
