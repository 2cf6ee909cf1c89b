//! Payment Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::Payment;
use super::repository::PaymentRepository;
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetPaymentQuery {
    pub id: String,
}

impl Query for GetPaymentQuery {
    type Output = Payment;
}

#[derive(Debug, Clone, Default)]
pub struct ListPaymentsQuery {
    pub invoice_id: Option<String>,
    pub customer_id: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl Query for ListPaymentsQuery {
    type Output = Page<Payment>;
}

pub struct PaymentQueries {
    payments: Arc<PaymentRepository>,
}

impl PaymentQueries {
    pub fn new(payments: Arc<PaymentRepository>) -> Self {
        Self { payments }
    }
}

#[async_trait]
impl QueryHandler<GetPaymentQuery> for PaymentQueries {
    async fn handle(&self, query: GetPaymentQuery) -> Result<Payment> {
        self.payments
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Payment", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListPaymentsQuery> for PaymentQueries {
    async fn handle(&self, query: ListPaymentsQuery) -> Result<Page<Payment>> {
        self.payments
            .search(query.invoice_id.as_deref(), query.customer_id.as_deref(), query.page, query.size)
            .await
    }
}
