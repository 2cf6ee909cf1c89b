//! Waiting List Repository

use std::sync::Arc;

use bson::{doc, Document};

use super::entity::{match_key, WaitingListEntry, WaitingListStatus};
use crate::shared::error::Result;
use crate::store::{DocumentStore, FindOptions, Page, TypedCollection};
use crate::usecase::HasId;

fn active_statuses() -> Vec<&'static str> {
    WaitingListStatus::ACTIVE.iter().map(|s| s.as_str()).collect()
}

pub struct WaitingListRepository {
    collection: TypedCollection<WaitingListEntry>,
}

impl WaitingListRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, WaitingListEntry::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<WaitingListEntry>> {
        self.collection.find_by_id(id).await
    }

    pub async fn search(
        &self,
        status: Option<WaitingListStatus>,
        customer_id: Option<&str>,
        page: u32,
        size: u32,
    ) -> Result<Page<WaitingListEntry>> {
        let mut filter = Document::new();
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }
        if let Some(customer_id) = customer_id {
            filter.insert("customerId", customer_id);
        }
        self.collection
            .find_page(filter, doc! { "createdAt": 1 }, page, size)
            .await
    }

    pub async fn find_active_for_customer(&self, customer_id: &str) -> Result<Vec<WaitingListEntry>> {
        self.collection
            .find(
                doc! { "customerId": customer_id, "status": { "$in": active_statuses() } },
                FindOptions::default(),
            )
            .await
    }

    /// Waiting entries for `make`, oldest first.
    pub async fn find_waiting_for_make(&self, make: &str) -> Result<Vec<WaitingListEntry>> {
        self.collection
            .find(
                doc! {
                    "status": WaitingListStatus::Waiting.as_str(),
                    "makeKey": match_key(make),
                },
                FindOptions::sorted(doc! { "createdAt": 1 }),
            )
            .await
    }

    pub async fn count_active(&self) -> Result<u64> {
        self.collection
            .count(doc! { "status": { "$in": active_statuses() } })
            .await
    }
}
