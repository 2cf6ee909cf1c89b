//! Service Order Operations

pub mod events;
pub mod lifecycle;
pub mod open;
pub mod tasks;

pub use events::*;
pub use lifecycle::{
    CancelServiceOrderCommand, CancelServiceOrderUseCase, CompleteServiceOrderCommand, CompleteServiceOrderUseCase,
    StartServiceOrderCommand, StartServiceOrderUseCase,
};
pub use open::{OpenServiceOrderCommand, OpenServiceOrderUseCase};
pub use tasks::{
    AddServiceTaskCommand, AddServiceTaskUseCase, AssignTechnicianCommand, AssignTechnicianUseCase,
    RemoveServiceTaskCommand, RemoveServiceTaskUseCase,
};

use super::entity::{ServiceOrder, ServiceOrderStatus};
use super::repository::ServiceOrderRepository;
use crate::shared::validation::invalid_transition;
use crate::usecase::UseCaseError;

pub(crate) async fn load_service_order(orders: &ServiceOrderRepository, id: &str) -> Result<ServiceOrder, UseCaseError> {
    orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("SERVICE_ORDER_NOT_FOUND", format!("Service order '{}' not found", id)))
}

pub(crate) fn require_status(
    order: &ServiceOrder,
    allowed: &[ServiceOrderStatus],
    to: ServiceOrderStatus,
) -> Result<(), UseCaseError> {
    if allowed.contains(&order.status) {
        Ok(())
    } else {
        Err(invalid_transition("Service order", order.status.as_str(), to.as_str()))
    }
}

/// Tasks and technician may only change while work is still open.
pub(crate) fn require_active(order: &ServiceOrder) -> Result<(), UseCaseError> {
    if order.status.is_active() {
        Ok(())
    } else {
        Err(UseCaseError::business_rule_with_details(
            "SERVICE_ORDER_CLOSED",
            format!("Service order is {}", order.status.as_str()),
            crate::details! { "status" => order.status.as_str() },
        ))
    }
}
