//! Create Sales Order / Update Pricing Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::{SalesOrderCreated, SalesOrderPricingUpdated};
use super::load_order;
use crate::customer::operations::load_customer;
use crate::customer::repository::CustomerRepository;
use crate::details;
use crate::mediator::Command;
use crate::sales_order::entity::{SalesOrder, SalesOrderStatus};
use crate::sales_order::repository::SalesOrderRepository;
use crate::shared::validation::{invalid_transition, optional};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, SerializableAggregate, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::operations::load_vehicle;
use crate::vehicle::repository::VehicleRepository;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalesOrderCommand {
    pub customer_id: String,
    pub vehicle_id: String,
    /// Defaults to the caller
    #[serde(default)]
    pub salesperson_id: Option<String>,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub trade_in_cents: i64,
    #[serde(default)]
    pub tax_rate_bps: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Command for CreateSalesOrderCommand {
    type Output = SalesOrderCreated;
}

pub struct CreateSalesOrderUseCase<U: UnitOfWork> {
    customers: Arc<CustomerRepository>,
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CreateSalesOrderUseCase<U> {
    pub fn new(customers: Arc<CustomerRepository>, vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            customers,
            vehicles,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: CreateSalesOrderCommand, ctx: ExecutionContext) -> UseCaseResult<SalesOrderCreated> {
        let customer = try_use_case!(load_customer(&self.customers, &command.customer_id).await);

        let mut vehicle = try_use_case!(load_vehicle(&self.vehicles, &command.vehicle_id).await);
        if !vehicle.is_available() {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "VEHICLE_NOT_AVAILABLE",
                format!("{} is not available for sale", vehicle.title()),
                details! { "vehicleId" => vehicle.id, "status" => vehicle.status.as_str() },
            ));
        }

        let salesperson_id = optional(command.salesperson_id.as_deref()).unwrap_or_else(|| ctx.principal_id.clone());
        let mut order = try_use_case!(SalesOrder::new(
            customer.id,
            vehicle.id.as_str(),
            salesperson_id,
            vehicle.price_cents,
            0,
        ));
        try_use_case!(order.set_pricing(
            vehicle.price_cents,
            command.discount_cents,
            command.trade_in_cents,
            command.tax_rate_bps,
        ));
        order.notes = optional(command.notes.as_deref());
        vehicle.reserve(&order.id);

        let event = SalesOrderCreated::new(&ctx, &order);
        let aggregates: Vec<Box<dyn SerializableAggregate>> = vec![Box::new(order), Box::new(vehicle)];
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(CreateSalesOrderUseCase, CreateSalesOrderCommand);

/// Reprice a draft order. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSalesOrderPricingCommand {
    #[serde(default)]
    pub order_id: String,
    pub vehicle_price_cents: Option<i64>,
    pub discount_cents: Option<i64>,
    pub trade_in_cents: Option<i64>,
    pub tax_rate_bps: Option<u32>,
}

impl Command for UpdateSalesOrderPricingCommand {
    type Output = SalesOrderPricingUpdated;
}

pub struct UpdateSalesOrderPricingUseCase<U: UnitOfWork> {
    orders: Arc<SalesOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> UpdateSalesOrderPricingUseCase<U> {
    pub fn new(orders: Arc<SalesOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self { orders, unit_of_work }
    }

    pub async fn execute(
        &self,
        command: UpdateSalesOrderPricingCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<SalesOrderPricingUpdated> {
        let mut order = try_use_case!(load_order(&self.orders, &command.order_id).await);
        if order.status != SalesOrderStatus::Draft {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "ORDER_NOT_DRAFT",
                format!("Pricing is locked once an order is {}", order.status.as_str()),
            ));
        }

        let previous_total = order.total_cents;
        try_use_case!(order.set_pricing(
            command.vehicle_price_cents.unwrap_or(order.vehicle_price_cents),
            command.discount_cents.unwrap_or(order.discount_cents),
            command.trade_in_cents.unwrap_or(order.trade_in_cents),
            command.tax_rate_bps.unwrap_or(order.tax_rate_bps),
        ));

        let event = SalesOrderPricingUpdated::new(&ctx, &order, previous_total);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(UpdateSalesOrderPricingUseCase, UpdateSalesOrderPricingCommand);

/// Guard shared by the lifecycle use cases.
pub(crate) fn require_status(order: &SalesOrder, allowed: &[SalesOrderStatus], to: SalesOrderStatus) -> Result<(), UseCaseError> {
    if allowed.contains(&order.status) {
        Ok(())
    } else {
        Err(invalid_transition("Sales order", order.status.as_str(), to.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_customer, seed_vehicle, Memory};
    use crate::vehicle::entity::VehicleStatus;

    struct Fixture {
        mem: Memory,
        orders: Arc<SalesOrderRepository>,
        vehicles: Arc<VehicleRepository>,
        uc: CreateSalesOrderUseCase<crate::usecase::InMemoryUnitOfWork>,
    }

    fn fixture() -> Fixture {
        let mem = Memory::new();
        let orders = Arc::new(SalesOrderRepository::new(mem.dyn_store()));
        let customers = Arc::new(CustomerRepository::new(mem.dyn_store()));
        let vehicles = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let uc = CreateSalesOrderUseCase::new(customers, vehicles.clone(), mem.uow.clone());
        Fixture {
            mem,
            orders,
            vehicles,
            uc,
        }
    }

    fn command(customer_id: &str, vehicle_id: &str) -> CreateSalesOrderCommand {
        CreateSalesOrderCommand {
            customer_id: customer_id.into(),
            vehicle_id: vehicle_id.into(),
            salesperson_id: None,
            discount_cents: 50_000,
            trade_in_cents: 150_000,
            tax_rate_bps: 800,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_reserves_vehicle() {
        let f = fixture();
        let customer = seed_customer(&f.mem, "ada@example.com").await;
        let vehicle = seed_vehicle(&f.mem, "2T1BURHE0JC074587").await;

        let event = f.uc.execute(command(&customer.id, &vehicle.id), ctx()).await.unwrap();

        let order = f.orders.find_by_id(&event.order_id).await.unwrap().unwrap();
        assert_eq!(order.salesperson_id, "staff-1");
        assert_eq!(order.subtotal_cents, 1_800_000);
        assert_eq!(order.tax_cents, 144_000);
        assert_eq!(order.total_cents, 1_944_000);

        let vehicle = f.vehicles.find_by_id(&vehicle.id).await.unwrap().unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Reserved);
        assert_eq!(vehicle.reserved_by_order_id.as_deref(), Some(order.id.as_str()));
        assert_eq!(f.mem.event_count("sales-order:created").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_reserve_vehicle_once() {
        let f = fixture();
        let customer = seed_customer(&f.mem, "ada@example.com").await;
        let vehicle = seed_vehicle(&f.mem, "2T1BURHE0JC074587").await;
        let uc = Arc::new(f.uc);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let uc = uc.clone();
                let command = command(&customer.id, &vehicle.id);
                tokio::spawn(async move { uc.execute(command, ctx()).await.into_result() })
            })
            .collect();

        let mut winners = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(event) => winners.push(event.order_id),
                Err(e) => assert!(["CONCURRENT_MODIFICATION", "VEHICLE_NOT_AVAILABLE"].contains(&e.code())),
            }
        }
        assert_eq!(winners.len(), 1);

        let stored = f.vehicles.find_by_id(&vehicle.id).await.unwrap().unwrap();
        assert_eq!(stored.reserved_by_order_id.as_deref(), Some(winners[0].as_str()));
        assert_eq!(stored.version, 1);
        assert_eq!(f.mem.event_count("sales-order:created").await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_unavailable_vehicle_and_unknown_customer() {
        let f = fixture();
        let customer = seed_customer(&f.mem, "ada@example.com").await;
        let vehicle = seed_vehicle(&f.mem, "2T1BURHE0JC074587").await;
        f.uc.execute(command(&customer.id, &vehicle.id), ctx()).await.unwrap();

        let second = f.uc.execute(command(&customer.id, &vehicle.id), ctx()).await;
        assert_eq!(second.unwrap_err().code(), "VEHICLE_NOT_AVAILABLE");

        let unknown = f.uc.execute(command("nobody", &vehicle.id), ctx()).await;
        assert_eq!(unknown.unwrap_err().code(), "CUSTOMER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_negative_subtotal_leaves_vehicle_untouched() {
        let f = fixture();
        let customer = seed_customer(&f.mem, "ada@example.com").await;
        let vehicle = seed_vehicle(&f.mem, "2T1BURHE0JC074587").await;

        let mut cmd = command(&customer.id, &vehicle.id);
        cmd.trade_in_cents = 5_000_000;
        assert_eq!(f.uc.execute(cmd, ctx()).await.unwrap_err().code(), "NEGATIVE_AMOUNT");

        let vehicle = f.vehicles.find_by_id(&vehicle.id).await.unwrap().unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_update_pricing_only_in_draft() {
        let f = fixture();
        let mut order = SalesOrder::new("C1", "V1", "S1", 2_000_000, 0).unwrap();
        f.mem.put(&order).await;
        let uc = UpdateSalesOrderPricingUseCase::new(f.orders.clone(), f.mem.uow.clone());

        let cmd = UpdateSalesOrderPricingCommand {
            order_id: order.id.clone(),
            discount_cents: Some(100_000),
            tax_rate_bps: Some(500),
            ..Default::default()
        };
        let event = uc.execute(cmd.clone(), ctx()).await.unwrap();
        assert_eq!(event.previous_total_cents, 2_000_000);
        assert_eq!(event.total_cents, 1_995_000);

        order.confirm();
        f.mem.put(&order).await;
        assert_eq!(uc.execute(cmd, ctx()).await.unwrap_err().code(), "ORDER_NOT_DRAFT");
    }
}
