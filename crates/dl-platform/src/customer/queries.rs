//! Customer Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::Customer;
use super::repository::CustomerRepository;
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetCustomerQuery {
    pub id: String,
}

impl Query for GetCustomerQuery {
    type Output = Customer;
}

pub struct ListCustomersQuery {
    pub search: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl Query for ListCustomersQuery {
    type Output = Page<Customer>;
}

pub struct CustomerQueries {
    customers: Arc<CustomerRepository>,
}

impl CustomerQueries {
    pub fn new(customers: Arc<CustomerRepository>) -> Self {
        Self { customers }
    }
}

#[async_trait]
impl QueryHandler<GetCustomerQuery> for CustomerQueries {
    async fn handle(&self, query: GetCustomerQuery) -> Result<Customer> {
        self.customers
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Customer", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListCustomersQuery> for CustomerQueries {
    async fn handle(&self, query: ListCustomersQuery) -> Result<Page<Customer>> {
        self.customers
            .search(query.search.as_deref(), query.page, query.size)
            .await
    }
}
