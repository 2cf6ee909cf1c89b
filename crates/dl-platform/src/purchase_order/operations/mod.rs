//! Purchase Order Operations

pub mod create;
pub mod events;
pub mod lifecycle;

pub use create::{
    CreatePurchaseOrderCommand, CreatePurchaseOrderUseCase, PurchaseOrderLineInput, UpdatePurchaseOrderCommand,
    UpdatePurchaseOrderUseCase,
};
pub use events::*;
pub use lifecycle::{
    CancelPurchaseOrderCommand, CancelPurchaseOrderUseCase, ReceivePurchaseOrderCommand, ReceivePurchaseOrderUseCase,
    SubmitPurchaseOrderCommand, SubmitPurchaseOrderUseCase,
};

use super::entity::{PurchaseOrder, PurchaseOrderStatus};
use super::repository::PurchaseOrderRepository;
use crate::shared::validation::invalid_transition;
use crate::usecase::UseCaseError;

pub(crate) async fn load_purchase_order(orders: &PurchaseOrderRepository, id: &str) -> Result<PurchaseOrder, UseCaseError> {
    orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("PURCHASE_ORDER_NOT_FOUND", format!("Purchase order '{}' not found", id)))
}

pub(crate) fn require_status(
    order: &PurchaseOrder,
    allowed: &[PurchaseOrderStatus],
    to: PurchaseOrderStatus,
) -> Result<(), UseCaseError> {
    if allowed.contains(&order.status) {
        Ok(())
    } else {
        Err(invalid_transition("Purchase order", order.status.as_str(), to.as_str()))
    }
}
