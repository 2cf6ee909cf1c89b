//! Sales Order Repository

use std::sync::Arc;

use bson::{doc, Document};
use chrono::{DateTime, Utc};

use super::entity::{SalesOrder, SalesOrderStatus};
use crate::shared::error::Result;
use crate::store::{DocumentStore, FindOptions, Page, TypedCollection};
use crate::usecase::HasId;

#[derive(Debug, Clone, Default)]
pub struct SalesOrderFilter {
    pub status: Option<SalesOrderStatus>,
    pub customer_id: Option<String>,
    pub salesperson_id: Option<String>,
}

impl SalesOrderFilter {
    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        if let Some(ref customer_id) = self.customer_id {
            filter.insert("customerId", customer_id.as_str());
        }
        if let Some(ref salesperson_id) = self.salesperson_id {
            filter.insert("salespersonId", salesperson_id.as_str());
        }
        filter
    }
}

pub struct SalesOrderRepository {
    collection: TypedCollection<SalesOrder>,
}

impl SalesOrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, SalesOrder::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<SalesOrder>> {
        self.collection.find_by_id(id).await
    }

    pub async fn search(&self, filter: &SalesOrderFilter, page: u32, size: u32) -> Result<Page<SalesOrder>> {
        self.collection
            .find_page(filter.to_document(), doc! { "createdAt": -1 }, page, size)
            .await
    }

    /// Orders that are not cancelled, completed ones included.
    pub async fn count_active_for_customer(&self, customer_id: &str) -> Result<u64> {
        self.collection
            .count(doc! { "customerId": customer_id, "status": { "$ne": SalesOrderStatus::Cancelled.as_str() } })
            .await
    }

    pub async fn count_by_status(&self, statuses: &[SalesOrderStatus]) -> Result<u64> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        self.collection.count(doc! { "status": { "$in": statuses } }).await
    }

    /// Completed orders whose `completedAt` falls in `[from, to)`.
    pub async fn find_completed_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<SalesOrder>> {
        self.collection
            .find(
                doc! {
                    "status": SalesOrderStatus::Completed.as_str(),
                    "completedAt": {
                        "$gte": bson::DateTime::from_chrono(from),
                        "$lt": bson::DateTime::from_chrono(to),
                    },
                },
                FindOptions::default(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_filters_and_active_count() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let repo = SalesOrderRepository::new(store.clone());
        let collection = TypedCollection::<SalesOrder>::new(store, SalesOrder::collection_name());

        let open = SalesOrder::new("C1", "V1", "S1", 1_000_000, 0).unwrap();
        let mut cancelled = SalesOrder::new("C1", "V2", "S2", 1_000_000, 0).unwrap();
        cancelled.cancel(None);
        let mut completed = SalesOrder::new("C2", "V3", "S1", 1_000_000, 0).unwrap();
        completed.complete();
        for order in [&open, &cancelled, &completed] {
            collection.insert(order).await.unwrap();
        }

        assert_eq!(repo.count_active_for_customer("C1").await.unwrap(), 1);
        let by_salesperson = SalesOrderFilter {
            salesperson_id: Some("S1".into()),
            ..Default::default()
        };
        assert_eq!(repo.search(&by_salesperson, 0, 20).await.unwrap().total, 2);
        assert_eq!(
            repo.count_by_status(&[SalesOrderStatus::Draft, SalesOrderStatus::Confirmed]).await.unwrap(),
            1
        );

        let now = Utc::now();
        let recent = repo
            .find_completed_between(now - chrono::Duration::hours(1), now + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, completed.id);
    }
}
