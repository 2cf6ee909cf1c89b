//! Service Order Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::ServiceOrder;
use super::repository::{ServiceOrderFilter, ServiceOrderRepository};
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetServiceOrderQuery {
    pub id: String,
}

impl Query for GetServiceOrderQuery {
    type Output = ServiceOrder;
}

#[derive(Debug, Clone, Default)]
pub struct ListServiceOrdersQuery {
    pub filter: ServiceOrderFilter,
    pub page: u32,
    pub size: u32,
}

impl Query for ListServiceOrdersQuery {
    type Output = Page<ServiceOrder>;
}

pub struct ServiceOrderQueries {
    service_orders: Arc<ServiceOrderRepository>,
}

impl ServiceOrderQueries {
    pub fn new(service_orders: Arc<ServiceOrderRepository>) -> Self {
        Self { service_orders }
    }
}

#[async_trait]
impl QueryHandler<GetServiceOrderQuery> for ServiceOrderQueries {
    async fn handle(&self, query: GetServiceOrderQuery) -> Result<ServiceOrder> {
        self.service_orders
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("ServiceOrder", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListServiceOrdersQuery> for ServiceOrderQueries {
    async fn handle(&self, query: ListServiceOrdersQuery) -> Result<Page<ServiceOrder>> {
        self.service_orders
            .search(&query.filter, query.page, query.size)
            .await
    }
}
