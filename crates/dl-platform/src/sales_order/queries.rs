//! Sales Order Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::SalesOrder;
use super::repository::{SalesOrderFilter, SalesOrderRepository};
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetSalesOrderQuery {
    pub id: String,
}

impl Query for GetSalesOrderQuery {
    type Output = SalesOrder;
}

#[derive(Debug, Clone, Default)]
pub struct ListSalesOrdersQuery {
    pub filter: SalesOrderFilter,
    pub page: u32,
    pub size: u32,
}

impl Query for ListSalesOrdersQuery {
    type Output = Page<SalesOrder>;
}

pub struct SalesOrderQueries {
    orders: Arc<SalesOrderRepository>,
}

impl SalesOrderQueries {
    pub fn new(orders: Arc<SalesOrderRepository>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl QueryHandler<GetSalesOrderQuery> for SalesOrderQueries {
    async fn handle(&self, query: GetSalesOrderQuery) -> Result<SalesOrder> {
        self.orders
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("SalesOrder", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListSalesOrdersQuery> for SalesOrderQueries {
    async fn handle(&self, query: ListSalesOrdersQuery) -> Result<Page<SalesOrder>> {
        self.orders.search(&query.filter, query.page, query.size).await
    }
}
