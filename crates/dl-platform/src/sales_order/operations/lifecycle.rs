//! Confirm / Complete / Cancel Sales Order Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::create::require_status;
use super::events::SalesOrderStatusChanged;
use super::load_order;
use crate::invoice::entity::{InvoiceSource, InvoiceStatus};
use crate::invoice::repository::InvoiceRepository;
use crate::mediator::Command;
use crate::sales_order::entity::SalesOrderStatus;
use crate::sales_order::repository::SalesOrderRepository;
use crate::shared::validation::optional;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, SerializableAggregate, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::repository::VehicleRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSalesOrderCommand {
    pub order_id: String,
}

impl Command for ConfirmSalesOrderCommand {
    type Output = SalesOrderStatusChanged;
}

pub struct ConfirmSalesOrderUseCase<U: UnitOfWork> {
    orders: Arc<SalesOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> ConfirmSalesOrderUseCase<U> {
    pub fn new(orders: Arc<SalesOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self { orders, unit_of_work }
    }

    pub async fn execute(
        &self,
        command: ConfirmSalesOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<SalesOrderStatusChanged> {
        let mut order = try_use_case!(load_order(&self.orders, &command.order_id).await);
        try_use_case!(require_status(&order, &[SalesOrderStatus::Draft], SalesOrderStatus::Confirmed));

        let previous = order.status;
        order.confirm();

        let event = SalesOrderStatusChanged::new(&ctx, &order, previous);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(ConfirmSalesOrderUseCase, ConfirmSalesOrderCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSalesOrderCommand {
    pub order_id: String,
}

impl Command for CompleteSalesOrderCommand {
    type Output = SalesOrderStatusChanged;
}

/// Completes a paid deal and marks the vehicle sold in the same commit.
pub struct CompleteSalesOrderUseCase<U: UnitOfWork> {
    orders: Arc<SalesOrderRepository>,
    vehicles: Arc<VehicleRepository>,
    invoices: Arc<InvoiceRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CompleteSalesOrderUseCase<U> {
    pub fn new(
        orders: Arc<SalesOrderRepository>,
        vehicles: Arc<VehicleRepository>,
        invoices: Arc<InvoiceRepository>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            orders,
            vehicles,
            invoices,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CompleteSalesOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<SalesOrderStatusChanged> {
        let mut order = try_use_case!(load_order(&self.orders, &command.order_id).await);
        try_use_case!(require_status(&order, &[SalesOrderStatus::Confirmed], SalesOrderStatus::Completed));

        let invoice = try_use_case!(
            self.invoices
                .find_active_for_source(InvoiceSource::SalesOrder, &order.id)
                .await
        );
        if !invoice.is_some_and(|i| i.status == InvoiceStatus::Paid) {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "INVOICE_NOT_PAID",
                "A sales order can only be completed once its invoice is paid",
            ));
        }

        let previous = order.status;
        order.complete();

        let mut aggregates: Vec<Box<dyn SerializableAggregate>> = Vec::new();
        match try_use_case!(self.vehicles.find_by_id(&order.vehicle_id).await) {
            Some(mut vehicle) => {
                vehicle.mark_sold();
                aggregates.push(Box::new(vehicle));
            }
            None => warn!(
                order_id = %order.id,
                vehicle_id = %order.vehicle_id,
                "Completed order references a missing vehicle"
            ),
        }

        let event = SalesOrderStatusChanged::new(&ctx, &order, previous);
        aggregates.insert(0, Box::new(order));
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(CompleteSalesOrderUseCase, CompleteSalesOrderCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSalesOrderCommand {
    pub order_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Command for CancelSalesOrderCommand {
    type Output = SalesOrderStatusChanged;
}

/// Cancels an open order and hands its vehicle back to the lot.
pub struct CancelSalesOrderUseCase<U: UnitOfWork> {
    orders: Arc<SalesOrderRepository>,
    vehicles: Arc<VehicleRepository>,
    invoices: Arc<InvoiceRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CancelSalesOrderUseCase<U> {
    pub fn new(
        orders: Arc<SalesOrderRepository>,
        vehicles: Arc<VehicleRepository>,
        invoices: Arc<InvoiceRepository>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            orders,
            vehicles,
            invoices,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CancelSalesOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<SalesOrderStatusChanged> {
        let mut order = try_use_case!(load_order(&self.orders, &command.order_id).await);
        try_use_case!(require_status(
            &order,
            &[SalesOrderStatus::Draft, SalesOrderStatus::Confirmed],
            SalesOrderStatus::Cancelled,
        ));

        let invoice = try_use_case!(
            self.invoices
                .find_active_for_source(InvoiceSource::SalesOrder, &order.id)
                .await
        );
        if let Some(invoice) = invoice {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "ORDER_HAS_INVOICE",
                "Void the order's invoice before cancelling",
                crate::details! { "invoiceId" => invoice.id, "invoiceStatus" => invoice.status.as_str() },
            ));
        }

        let previous = order.status;
        order.cancel(optional(command.reason.as_deref()));

        let mut aggregates: Vec<Box<dyn SerializableAggregate>> = Vec::new();
        if let Some(mut vehicle) = try_use_case!(self.vehicles.find_by_id(&order.vehicle_id).await) {
            // Only release a reservation this order holds
            if vehicle.reserved_by_order_id.as_deref() == Some(order.id.as_str()) {
                vehicle.release();
                aggregates.push(Box::new(vehicle));
            }
        }

        let event = SalesOrderStatusChanged::new(&ctx, &order, previous);
        aggregates.insert(0, Box::new(order));
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(CancelSalesOrderUseCase, CancelSalesOrderCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::entity::{Invoice, InvoiceLine};
    use crate::sales_order::entity::SalesOrder;
    use crate::test_support::{ctx, seed_vehicle, Memory};
    use crate::vehicle::entity::VehicleStatus;

    struct Fixture {
        mem: Memory,
        orders: Arc<SalesOrderRepository>,
        vehicles: Arc<VehicleRepository>,
        invoices: Arc<InvoiceRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            let mem = Memory::new();
            Self {
                orders: Arc::new(SalesOrderRepository::new(mem.dyn_store())),
                vehicles: Arc::new(VehicleRepository::new(mem.dyn_store())),
                invoices: Arc::new(InvoiceRepository::new(mem.dyn_store())),
                mem,
            }
        }

        /// A confirmed order holding a reserved vehicle.
        async fn confirmed_order(&self) -> SalesOrder {
            let mut vehicle = seed_vehicle(&self.mem, "2T1BURHE0JC074587").await;
            let mut order = SalesOrder::new("C1", vehicle.id.as_str(), "staff-1", vehicle.price_cents, 0).unwrap();
            order.confirm();
            vehicle.reserve(&order.id);
            self.mem.put(&vehicle).await;
            self.mem.put(&order).await;
            order
        }

        async fn invoice(&self, order: &SalesOrder, paid: bool) -> Invoice {
            let lines = vec![InvoiceLine::new("Vehicle", 1, order.subtotal_cents).unwrap()];
            let mut invoice = Invoice::issue("C1", InvoiceSource::SalesOrder, order.id.as_str(), lines, 0).unwrap();
            if paid {
                invoice.apply_payment(invoice.total_cents);
            }
            self.mem.put(&invoice).await;
            invoice
        }
    }

    #[tokio::test]
    async fn test_confirm_only_from_draft() {
        let f = Fixture::new();
        let order = SalesOrder::new("C1", "V1", "staff-1", 1_000_000, 0).unwrap();
        f.mem.put(&order).await;
        let uc = ConfirmSalesOrderUseCase::new(f.orders.clone(), f.mem.uow.clone());

        let cmd = ConfirmSalesOrderCommand { order_id: order.id.clone() };
        let event = uc.execute(cmd.clone(), ctx()).await.unwrap();
        assert_eq!(event.previous_status, SalesOrderStatus::Draft);
        assert_eq!(uc.execute(cmd, ctx()).await.unwrap_err().code(), "INVALID_STATUS_TRANSITION");
    }

    #[tokio::test]
    async fn test_complete_requires_paid_invoice_and_sells_vehicle() {
        let f = Fixture::new();
        let order = f.confirmed_order().await;
        let uc = CompleteSalesOrderUseCase::new(f.orders.clone(), f.vehicles.clone(), f.invoices.clone(), f.mem.uow.clone());
        let cmd = CompleteSalesOrderCommand { order_id: order.id.clone() };

        assert_eq!(uc.execute(cmd.clone(), ctx()).await.unwrap_err().code(), "INVOICE_NOT_PAID");
        let mut unpaid = f.invoice(&order, false).await;
        assert_eq!(uc.execute(cmd.clone(), ctx()).await.unwrap_err().code(), "INVOICE_NOT_PAID");

        unpaid.apply_payment(unpaid.total_cents);
        f.mem.put(&unpaid).await;
        uc.execute(cmd, ctx()).await.unwrap();

        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SalesOrderStatus::Completed);
        let vehicle = f.vehicles.find_by_id(&order.vehicle_id).await.unwrap().unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Sold);
        assert!(vehicle.sold_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_releases_vehicle() {
        let f = Fixture::new();
        let order = f.confirmed_order().await;
        let uc = CancelSalesOrderUseCase::new(f.orders.clone(), f.vehicles.clone(), f.invoices.clone(), f.mem.uow.clone());

        let cmd = CancelSalesOrderCommand {
            order_id: order.id.clone(),
            reason: Some("Customer changed their mind".into()),
        };
        let event = uc.execute(cmd.clone(), ctx()).await.unwrap();
        assert_eq!(event.reason.as_deref(), Some("Customer changed their mind"));

        let vehicle = f.vehicles.find_by_id(&order.vehicle_id).await.unwrap().unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert!(vehicle.reserved_by_order_id.is_none());

        assert_eq!(uc.execute(cmd, ctx()).await.unwrap_err().code(), "INVALID_STATUS_TRANSITION");
    }

    #[tokio::test]
    async fn test_cancel_blocked_by_invoice() {
        let f = Fixture::new();
        let order = f.confirmed_order().await;
        f.invoice(&order, false).await;
        let uc = CancelSalesOrderUseCase::new(f.orders.clone(), f.vehicles.clone(), f.invoices.clone(), f.mem.uow.clone());

        let cmd = CancelSalesOrderCommand {
            order_id: order.id.clone(),
            reason: None,
        };
        assert_eq!(uc.execute(cmd, ctx()).await.unwrap_err().code(), "ORDER_HAS_INVOICE");
        let vehicle = f.vehicles.find_by_id(&order.vehicle_id).await.unwrap().unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Reserved);
    }
}
