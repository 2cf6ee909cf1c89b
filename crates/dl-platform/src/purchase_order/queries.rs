//! Purchase Order Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::{PurchaseOrder, PurchaseOrderStatus};
use super::repository::PurchaseOrderRepository;
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetPurchaseOrderQuery {
    pub id: String,
}

impl Query for GetPurchaseOrderQuery {
    type Output = PurchaseOrder;
}

#[derive(Debug, Clone, Default)]
pub struct ListPurchaseOrdersQuery {
    pub status: Option<PurchaseOrderStatus>,
    pub page: u32,
    pub size: u32,
}

impl Query for ListPurchaseOrdersQuery {
    type Output = Page<PurchaseOrder>;
}

pub struct PurchaseOrderQueries {
    orders: Arc<PurchaseOrderRepository>,
}

impl PurchaseOrderQueries {
    pub fn new(orders: Arc<PurchaseOrderRepository>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl QueryHandler<GetPurchaseOrderQuery> for PurchaseOrderQueries {
    async fn handle(&self, query: GetPurchaseOrderQuery) -> Result<PurchaseOrder> {
        self.orders
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("PurchaseOrder", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListPurchaseOrdersQuery> for PurchaseOrderQueries {
    async fn handle(&self, query: ListPurchaseOrdersQuery) -> Result<Page<PurchaseOrder>> {
        self.orders.search(query.status, query.page, query.size).await
    }
}
