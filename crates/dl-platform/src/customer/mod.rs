//! Customers (CRM).

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{Address, Customer, CustomerNote};
pub use repository::CustomerRepository;

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{CustomerQueries, GetCustomerQuery, ListCustomersQuery};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    let customers = &repos.customers;
    mediator.register_command::<CreateCustomerCommand, _>(Arc::new(CreateCustomerUseCase::new(
        customers.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<UpdateCustomerCommand, _>(Arc::new(UpdateCustomerUseCase::new(
        customers.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<AddCustomerNoteCommand, _>(Arc::new(AddCustomerNoteUseCase::new(
        customers.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<DeleteCustomerCommand, _>(Arc::new(DeleteCustomerUseCase::new(
        customers.clone(),
        repos.sales_orders.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(CustomerQueries::new(customers.clone()));
    mediator.register_query::<GetCustomerQuery, _>(queries.clone());
    mediator.register_query::<ListCustomersQuery, _>(queries);
}
