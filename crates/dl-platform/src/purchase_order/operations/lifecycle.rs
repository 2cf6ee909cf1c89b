//! Submit / Receive / Cancel Purchase Order Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::events::PurchaseOrderStatusChanged;
use super::{load_purchase_order, require_status};
use crate::details;
use crate::mediator::Command;
use crate::purchase_order::entity::PurchaseOrderStatus;
use crate::purchase_order::repository::PurchaseOrderRepository;
use crate::shared::validation::optional;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, SerializableAggregate, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::repository::VehicleRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPurchaseOrderCommand {
    pub order_id: String,
}

impl Command for SubmitPurchaseOrderCommand {
    type Output = PurchaseOrderStatusChanged;
}

pub struct SubmitPurchaseOrderUseCase<U: UnitOfWork> {
    orders: Arc<PurchaseOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> SubmitPurchaseOrderUseCase<U> {
    pub fn new(orders: Arc<PurchaseOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self { orders, unit_of_work }
    }

    pub async fn execute(
        &self,
        command: SubmitPurchaseOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<PurchaseOrderStatusChanged> {
        let mut order = try_use_case!(load_purchase_order(&self.orders, &command.order_id).await);
        try_use_case!(require_status(&order, &[PurchaseOrderStatus::Draft], PurchaseOrderStatus::Submitted));

        let previous = order.status;
        order.submit();

        let event = PurchaseOrderStatusChanged::new(&ctx, &order, previous);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(SubmitPurchaseOrderUseCase, SubmitPurchaseOrderCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePurchaseOrderCommand {
    pub order_id: String,
}

impl Command for ReceivePurchaseOrderCommand {
    type Output = PurchaseOrderStatusChanged;
}

/// Books the delivered vehicles into inventory together with the order.
pub struct ReceivePurchaseOrderUseCase<U: UnitOfWork> {
    orders: Arc<PurchaseOrderRepository>,
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> ReceivePurchaseOrderUseCase<U> {
    pub fn new(orders: Arc<PurchaseOrderRepository>, vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            orders,
            vehicles,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: ReceivePurchaseOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<PurchaseOrderStatusChanged> {
        let mut order = try_use_case!(load_purchase_order(&self.orders, &command.order_id).await);
        try_use_case!(require_status(&order, &[PurchaseOrderStatus::Submitted], PurchaseOrderStatus::Received));

        // A vehicle may have been stocked by hand since the order was written
        for line in &order.lines {
            if try_use_case!(self.vehicles.exists_by_vin(&line.vin).await) {
                return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                    "VIN_EXISTS",
                    format!("VIN {} is already in inventory", line.vin),
                    details! { "vin" => line.vin.as_str() },
                ));
            }
        }

        let previous = order.status;
        let vehicles = order.receive();

        let event = PurchaseOrderStatusChanged::new(&ctx, &order, previous);
        let mut aggregates: Vec<Box<dyn SerializableAggregate>> = Vec::with_capacity(vehicles.len() + 1);
        aggregates.push(Box::new(order));
        for vehicle in vehicles {
            aggregates.push(Box::new(vehicle));
        }
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(ReceivePurchaseOrderUseCase, ReceivePurchaseOrderCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelPurchaseOrderCommand {
    pub order_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Command for CancelPurchaseOrderCommand {
    type Output = PurchaseOrderStatusChanged;
}

pub struct CancelPurchaseOrderUseCase<U: UnitOfWork> {
    orders: Arc<PurchaseOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CancelPurchaseOrderUseCase<U> {
    pub fn new(orders: Arc<PurchaseOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self { orders, unit_of_work }
    }

    pub async fn execute(
        &self,
        command: CancelPurchaseOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<PurchaseOrderStatusChanged> {
        let mut order = try_use_case!(load_purchase_order(&self.orders, &command.order_id).await);
        try_use_case!(require_status(
            &order,
            &[PurchaseOrderStatus::Draft, PurchaseOrderStatus::Submitted],
            PurchaseOrderStatus::Cancelled,
        ));

        let previous = order.status;
        order.cancel(optional(command.reason.as_deref()));

        let event = PurchaseOrderStatusChanged::new(&ctx, &order, previous);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(CancelPurchaseOrderUseCase, CancelPurchaseOrderCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase_order::entity::{PurchaseOrder, PurchaseOrderLine};
    use crate::test_support::{ctx, seed_vehicle, Memory};
    use crate::vehicle::entity::{VehicleCondition, VehicleStatus};

    fn line(vin: &str) -> PurchaseOrderLine {
        PurchaseOrderLine {
            vin: vin.into(),
            make: "Mazda".into(),
            model: "CX-5".into(),
            year: 2024,
            color: None,
            condition: VehicleCondition::New,
            unit_cost_cents: 2_800_000,
            list_price_cents: 3_200_000,
            vehicle_id: None,
        }
    }

    async fn seed_order(mem: &Memory, vins: &[&str]) -> PurchaseOrder {
        let order = PurchaseOrder::new("Mazda Distribution", vins.iter().map(|v| line(v)).collect(), "staff-1").unwrap();
        mem.put(&order).await;
        order
    }

    #[tokio::test]
    async fn test_receive_requires_submission_and_stocks_vehicles() {
        let mem = Memory::new();
        let orders = Arc::new(PurchaseOrderRepository::new(mem.dyn_store()));
        let vehicles = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let order = seed_order(&mem, &["JM3KFBCM1R0100001", "JM3KFBCM1R0100002"]).await;

        let receive = ReceivePurchaseOrderUseCase::new(orders.clone(), vehicles.clone(), mem.uow.clone());
        let cmd = ReceivePurchaseOrderCommand {
            order_id: order.id.clone(),
        };
        assert_eq!(
            receive.execute(cmd.clone(), ctx()).await.unwrap_err().code(),
            "INVALID_STATUS_TRANSITION"
        );

        let submit = SubmitPurchaseOrderUseCase::new(orders.clone(), mem.uow.clone());
        submit
            .execute(SubmitPurchaseOrderCommand { order_id: order.id.clone() }, ctx())
            .await
            .unwrap();

        let event = receive.execute(cmd, ctx()).await.unwrap();
        assert_eq!(event.vehicle_ids.len(), 2);
        for id in &event.vehicle_ids {
            let vehicle = vehicles.find_by_id(id).await.unwrap().unwrap();
            assert_eq!(vehicle.status, VehicleStatus::Available);
        }
        assert!(vehicles.exists_by_vin("JM3KFBCM1R0100002").await.unwrap());
        assert_eq!(mem.event_count("purchase-order:received").await, 1);
    }

    #[tokio::test]
    async fn test_receive_is_all_or_nothing() {
        let mem = Memory::new();
        let orders = Arc::new(PurchaseOrderRepository::new(mem.dyn_store()));
        let vehicles = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let mut order = seed_order(&mem, &["JM3KFBCM1R0100001", "2T1BURHE0JC074587"]).await;
        order.submit();
        mem.put(&order).await;
        seed_vehicle(&mem, "2T1BURHE0JC074587").await;

        let receive = ReceivePurchaseOrderUseCase::new(orders.clone(), vehicles.clone(), mem.uow.clone());
        let result = receive
            .execute(ReceivePurchaseOrderCommand { order_id: order.id.clone() }, ctx())
            .await;
        assert_eq!(result.unwrap_err().code(), "VIN_EXISTS");
        assert!(!vehicles.exists_by_vin("JM3KFBCM1R0100001").await.unwrap());
        let stored = orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PurchaseOrderStatus::Submitted);
    }

    #[tokio::test]
    async fn test_cancel_only_before_receipt() {
        let mem = Memory::new();
        let orders = Arc::new(PurchaseOrderRepository::new(mem.dyn_store()));
        let order = seed_order(&mem, &["JM3KFBCM1R0100001"]).await;
        let cancel = CancelPurchaseOrderUseCase::new(orders, mem.uow.clone());
        let cmd = CancelPurchaseOrderCommand {
            order_id: order.id.clone(),
            reason: Some("Supplier out of stock".into()),
        };

        let event = cancel.execute(cmd.clone(), ctx()).await.unwrap();
        assert_eq!(event.status, PurchaseOrderStatus::Cancelled);
        assert_eq!(cancel.execute(cmd, ctx()).await.unwrap_err().code(), "INVALID_STATUS_TRANSITION");
    }
}
