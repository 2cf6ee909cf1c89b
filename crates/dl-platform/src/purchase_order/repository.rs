//! Purchase Order Repository

use std::sync::Arc;

use bson::{doc, Document};

use super::entity::{PurchaseOrder, PurchaseOrderStatus};
use crate::shared::error::Result;
use crate::store::{DocumentStore, FindOptions, Page, TypedCollection};
use crate::usecase::HasId;

pub struct PurchaseOrderRepository {
    collection: TypedCollection<PurchaseOrder>,
}

impl PurchaseOrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, PurchaseOrder::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<PurchaseOrder>> {
        self.collection.find_by_id(id).await
    }

    pub async fn search(&self, status: Option<PurchaseOrderStatus>, page: u32, size: u32) -> Result<Page<PurchaseOrder>> {
        let mut filter = Document::new();
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }
        self.collection
            .find_page(filter, doc! { "createdAt": -1 }, page, size)
            .await
    }

    /// Draft or submitted order, other than `exclude_id`, that already lists `vin`.
    pub async fn find_pending_with_vin(&self, vin: &str, exclude_id: Option<&str>) -> Result<Option<PurchaseOrder>> {
        let pending = doc! {
            "status": { "$in": [PurchaseOrderStatus::Draft.as_str(), PurchaseOrderStatus::Submitted.as_str()] },
        };
        let orders = self.collection.find(pending, FindOptions::default()).await?;
        Ok(orders
            .into_iter()
            .filter(|o| Some(o.id.as_str()) != exclude_id)
            .find(|o| o.lines.iter().any(|l| l.vin == vin)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase_order::entity::PurchaseOrderLine;
    use crate::store::InMemoryStore;
    use crate::vehicle::entity::VehicleCondition;

    #[tokio::test]
    async fn test_pending_vin_lookup() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let repo = PurchaseOrderRepository::new(store.clone());
        let collection = TypedCollection::<PurchaseOrder>::new(store, PurchaseOrder::collection_name());

        let line = PurchaseOrderLine {
            vin: "JM3KFBCM1R0100001".into(),
            make: "Mazda".into(),
            model: "CX-5".into(),
            year: 2024,
            color: None,
            condition: VehicleCondition::New,
            unit_cost_cents: 2_800_000,
            list_price_cents: 3_200_000,
            vehicle_id: None,
        };
        let order = PurchaseOrder::new("Mazda Distribution", vec![line], "staff-1").unwrap();
        collection.insert(&order).await.unwrap();

        assert!(repo.find_pending_with_vin("JM3KFBCM1R0100001", None).await.unwrap().is_some());
        assert!(repo
            .find_pending_with_vin("JM3KFBCM1R0100001", Some(&order.id))
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.search(Some(PurchaseOrderStatus::Draft), 0, 20).await.unwrap().total, 1);
        assert_eq!(repo.search(Some(PurchaseOrderStatus::Received), 0, 20).await.unwrap().total, 0);
    }
}
