//! Stock purchasing from suppliers.

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
pub use repository::PurchaseOrderRepository;

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{GetPurchaseOrderQuery, ListPurchaseOrdersQuery, PurchaseOrderQueries};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    let orders = &repos.purchase_orders;
    mediator.register_command::<CreatePurchaseOrderCommand, _>(Arc::new(CreatePurchaseOrderUseCase::new(
        orders.clone(),
        repos.vehicles.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<UpdatePurchaseOrderCommand, _>(Arc::new(UpdatePurchaseOrderUseCase::new(
        orders.clone(),
        repos.vehicles.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<SubmitPurchaseOrderCommand, _>(Arc::new(SubmitPurchaseOrderUseCase::new(
        orders.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<ReceivePurchaseOrderCommand, _>(Arc::new(ReceivePurchaseOrderUseCase::new(
        orders.clone(),
        repos.vehicles.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<CancelPurchaseOrderCommand, _>(Arc::new(CancelPurchaseOrderUseCase::new(
        orders.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(PurchaseOrderQueries::new(orders.clone()));
    mediator.register_query::<GetPurchaseOrderQuery, _>(queries.clone());
    mediator.register_query::<ListPurchaseOrdersQuery, _>(queries);
}
