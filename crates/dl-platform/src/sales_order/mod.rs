//! Vehicle sales.

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{SalesOrder, SalesOrderStatus};
pub use repository::{SalesOrderFilter, SalesOrderRepository};

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{GetSalesOrderQuery, ListSalesOrdersQuery, SalesOrderQueries};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    let orders = &repos.sales_orders;
    mediator.register_command::<CreateSalesOrderCommand, _>(Arc::new(CreateSalesOrderUseCase::new(
        repos.customers.clone(),
        repos.vehicles.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<UpdateSalesOrderPricingCommand, _>(Arc::new(UpdateSalesOrderPricingUseCase::new(
        orders.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<ConfirmSalesOrderCommand, _>(Arc::new(ConfirmSalesOrderUseCase::new(
        orders.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<CompleteSalesOrderCommand, _>(Arc::new(CompleteSalesOrderUseCase::new(
        orders.clone(),
        repos.vehicles.clone(),
        repos.invoices.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<CancelSalesOrderCommand, _>(Arc::new(CancelSalesOrderUseCase::new(
        orders.clone(),
        repos.vehicles.clone(),
        repos.invoices.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(SalesOrderQueries::new(orders.clone()));
    mediator.register_query::<GetSalesOrderQuery, _>(queries.clone());
    mediator.register_query::<ListSalesOrdersQuery, _>(queries);
}
