//! Invoice Repository

use std::sync::Arc;

use bson::{doc, Document};
use chrono::{DateTime, Utc};

use super::entity::{Invoice, InvoiceSource, InvoiceStatus};
use crate::shared::error::Result;
use crate::store::{DocumentStore, FindOptions, Page, TypedCollection};
use crate::usecase::HasId;

fn outstanding_statuses() -> Vec<&'static str> {
    InvoiceStatus::OUTSTANDING.iter().map(|s| s.as_str()).collect()
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<String>,
    /// Only issued or partially paid invoices
    pub outstanding: bool,
}

impl InvoiceFilter {
    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(ref customer_id) = self.customer_id {
            filter.insert("customerId", customer_id.as_str());
        }
        match (self.status, self.outstanding) {
            (Some(status), true) => {
                filter.insert(
                    "$and",
                    vec![
                        doc! { "status": status.as_str() },
                        doc! { "status": { "$in": outstanding_statuses() } },
                    ],
                );
            }
            (Some(status), false) => {
                filter.insert("status", status.as_str());
            }
            (None, true) => {
                filter.insert("status", doc! { "$in": outstanding_statuses() });
            }
            (None, false) => {}
        }
        filter
    }
}

pub struct InvoiceRepository {
    collection: TypedCollection<Invoice>,
}

impl InvoiceRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, Invoice::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        self.collection.find_by_id(id).await
    }

    pub async fn search(&self, filter: &InvoiceFilter, page: u32, size: u32) -> Result<Page<Invoice>> {
        self.collection
            .find_page(filter.to_document(), doc! { "issuedAt": -1 }, page, size)
            .await
    }

    pub async fn find_by_source(&self, source_type: InvoiceSource, source_id: &str) -> Result<Vec<Invoice>> {
        self.collection
            .find(
                doc! { "sourceType": source_type.as_str(), "sourceId": source_id },
                FindOptions::sorted(doc! { "issuedAt": -1 }),
            )
            .await
    }

    /// The invoice for a source that has not been voided, if any.
    pub async fn find_active_for_source(&self, source_type: InvoiceSource, source_id: &str) -> Result<Option<Invoice>> {
        self.collection
            .find_one(doc! {
                "sourceType": source_type.as_str(),
                "sourceId": source_id,
                "status": { "$ne": InvoiceStatus::Void.as_str() },
            })
            .await
    }

    pub async fn find_outstanding(&self) -> Result<Vec<Invoice>> {
        self.collection
            .find(doc! { "status": { "$in": outstanding_statuses() } }, FindOptions::default())
            .await
    }

    pub async fn count_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        self.collection
            .count(doc! {
                "status": { "$in": outstanding_statuses() },
                "dueAt": { "$lt": bson::DateTime::from_chrono(now) },
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::entity::InvoiceLine;
    use crate::store::InMemoryStore;
    use chrono::Duration;

    fn invoice(customer: &str, source: &str) -> Invoice {
        let lines = vec![InvoiceLine::new("Oil change", 1, 8_000).unwrap()];
        Invoice::issue(customer, InvoiceSource::ServiceOrder, source, lines, 0).unwrap()
    }

    #[tokio::test]
    async fn test_outstanding_and_source_lookup() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let repo = InvoiceRepository::new(store.clone());
        let collection = TypedCollection::<Invoice>::new(store, Invoice::collection_name());

        let mut voided = invoice("C1", "SVC1");
        voided.void("wrong labor rate");
        let open = invoice("C1", "SVC1");
        let mut paid = invoice("C2", "SVC2");
        paid.apply_payment(paid.total_cents);
        for inv in [&voided, &open, &paid] {
            collection.insert(inv).await.unwrap();
        }

        let active = repo.find_active_for_source(InvoiceSource::ServiceOrder, "SVC1").await.unwrap();
        assert_eq!(active.unwrap().id, open.id);
        assert_eq!(repo.find_by_source(InvoiceSource::ServiceOrder, "SVC1").await.unwrap().len(), 2);

        let outstanding = InvoiceFilter {
            outstanding: true,
            ..Default::default()
        };
        assert_eq!(repo.search(&outstanding, 0, 20).await.unwrap().total, 1);
        let c1_void = InvoiceFilter {
            customer_id: Some("C1".into()),
            status: Some(InvoiceStatus::Void),
            ..Default::default()
        };
        assert_eq!(repo.search(&c1_void, 0, 20).await.unwrap().total, 1);

        assert_eq!(repo.count_overdue(Utc::now()).await.unwrap(), 0);
        assert_eq!(repo.count_overdue(Utc::now() + Duration::days(31)).await.unwrap(), 1);
    }
}
