//! Workshop repair orders.

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{ServiceOrder, ServiceOrderStatus, ServiceTask};
pub use repository::{ServiceOrderFilter, ServiceOrderRepository};

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{GetServiceOrderQuery, ListServiceOrdersQuery, ServiceOrderQueries};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    let service_orders = &repos.service_orders;
    mediator.register_command::<OpenServiceOrderCommand, _>(Arc::new(OpenServiceOrderUseCase::new(
        repos.customers.clone(),
        repos.vehicles.clone(),
        service_orders.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<AddServiceTaskCommand, _>(Arc::new(AddServiceTaskUseCase::new(
        service_orders.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<RemoveServiceTaskCommand, _>(Arc::new(RemoveServiceTaskUseCase::new(
        service_orders.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<AssignTechnicianCommand, _>(Arc::new(AssignTechnicianUseCase::new(
        service_orders.clone(),
        repos.users.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<StartServiceOrderCommand, _>(Arc::new(StartServiceOrderUseCase::new(
        service_orders.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<CompleteServiceOrderCommand, _>(Arc::new(CompleteServiceOrderUseCase::new(
        service_orders.clone(),
        repos.vehicles.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<CancelServiceOrderCommand, _>(Arc::new(CancelServiceOrderUseCase::new(
        service_orders.clone(),
        repos.vehicles.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(ServiceOrderQueries::new(service_orders.clone()));
    mediator.register_query::<GetServiceOrderQuery, _>(queries.clone());
    mediator.register_query::<ListServiceOrdersQuery, _>(queries);
}
