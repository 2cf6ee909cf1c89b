//! Invoice Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::Invoice;
use super::repository::{InvoiceFilter, InvoiceRepository};
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetInvoiceQuery {
    pub id: String,
}

impl Query for GetInvoiceQuery {
    type Output = Invoice;
}

#[derive(Debug, Clone, Default)]
pub struct ListInvoicesQuery {
    pub filter: InvoiceFilter,
    pub page: u32,
    pub size: u32,
}

impl Query for ListInvoicesQuery {
    type Output = Page<Invoice>;
}

pub struct InvoiceQueries {
    invoices: Arc<InvoiceRepository>,
}

impl InvoiceQueries {
    pub fn new(invoices: Arc<InvoiceRepository>) -> Self {
        Self { invoices }
    }
}

#[async_trait]
impl QueryHandler<GetInvoiceQuery> for InvoiceQueries {
    async fn handle(&self, query: GetInvoiceQuery) -> Result<Invoice> {
        self.invoices
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Invoice", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListInvoicesQuery> for InvoiceQueries {
    async fn handle(&self, query: ListInvoicesQuery) -> Result<Page<Invoice>> {
        self.invoices.search(&query.filter, query.page, query.size).await
    }
}
