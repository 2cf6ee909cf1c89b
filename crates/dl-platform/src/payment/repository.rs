//! Payment Repository

use std::sync::Arc;

use bson::{doc, Document};

use super::entity::Payment;
use crate::shared::error::Result;
use crate::store::{DocumentStore, Page, TypedCollection};
use crate::usecase::HasId;

pub struct PaymentRepository {
    collection: TypedCollection<Payment>,
}

impl PaymentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, Payment::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        self.collection.find_by_id(id).await
    }

    pub async fn search(
        &self,
        invoice_id: Option<&str>,
        customer_id: Option<&str>,
        page: u32,
        size: u32,
    ) -> Result<Page<Payment>> {
        let mut filter = Document::new();
        if let Some(invoice_id) = invoice_id {
            filter.insert("invoiceId", invoice_id);
        }
        if let Some(customer_id) = customer_id {
            filter.insert("customerId", customer_id);
        }
        self.collection
            .find_page(filter, doc! { "createdAt": -1 }, page, size)
            .await
    }
}
