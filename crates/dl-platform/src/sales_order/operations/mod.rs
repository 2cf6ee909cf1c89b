//! Sales Order Operations

pub mod create;
pub mod events;
pub mod lifecycle;

pub use create::{
    CreateSalesOrderCommand, CreateSalesOrderUseCase, UpdateSalesOrderPricingCommand, UpdateSalesOrderPricingUseCase,
};
pub use events::*;
pub use lifecycle::{
    CancelSalesOrderCommand, CancelSalesOrderUseCase, CompleteSalesOrderCommand, CompleteSalesOrderUseCase,
    ConfirmSalesOrderCommand, ConfirmSalesOrderUseCase,
};

use super::entity::SalesOrder;
use super::repository::SalesOrderRepository;
use crate::usecase::UseCaseError;

pub(crate) async fn load_order(orders: &SalesOrderRepository, id: &str) -> Result<SalesOrder, UseCaseError> {
    orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("SALES_ORDER_NOT_FOUND", format!("Sales order '{}' not found", id)))
}
