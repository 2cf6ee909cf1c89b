//! Issue Sales / Service Invoice Use Cases
//!
//! A source document carries at most one invoice that is not void.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::InvoiceIssued;
use crate::details;
use crate::invoice::entity::{Invoice, InvoiceLine, InvoiceSource};
use crate::invoice::repository::InvoiceRepository;
use crate::mediator::Command;
use crate::sales_order::entity::{SalesOrder, SalesOrderStatus};
use crate::sales_order::operations::load_order;
use crate::sales_order::repository::SalesOrderRepository;
use crate::service_order::entity::{ServiceOrder, ServiceOrderStatus};
use crate::service_order::operations::load_service_order;
use crate::service_order::repository::ServiceOrderRepository;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::repository::VehicleRepository;

async fn ensure_not_invoiced(
    invoices: &InvoiceRepository,
    source_type: InvoiceSource,
    source_id: &str,
) -> Result<(), UseCaseError> {
    if let Some(existing) = invoices.find_active_for_source(source_type, source_id).await? {
        return Err(UseCaseError::business_rule_with_details(
            "ALREADY_INVOICED",
            format!("Invoice {} already covers this order", existing.invoice_number),
            details! { "invoiceId" => existing.id },
        ));
    }
    Ok(())
}

/// Vehicle line plus credits for discount and trade-in.
fn sales_lines(order: &SalesOrder, vehicle_title: &str) -> Result<Vec<InvoiceLine>, UseCaseError> {
    let mut lines = vec![InvoiceLine::new(vehicle_title, 1, order.vehicle_price_cents)?];
    if order.discount_cents > 0 {
        lines.push(InvoiceLine::new("Discount", 1, -order.discount_cents)?);
    }
    if order.trade_in_cents > 0 {
        lines.push(InvoiceLine::new("Trade-in allowance", 1, -order.trade_in_cents)?);
    }
    Ok(lines)
}

/// One labor line and, when parts were used, one parts line per task.
fn service_lines(order: &ServiceOrder) -> Result<Vec<InvoiceLine>, UseCaseError> {
    let mut lines = Vec::with_capacity(order.tasks.len() * 2);
    for task in &order.tasks {
        lines.push(InvoiceLine::new(
            format!("Labor: {} ({} h)", task.description, task.hours()),
            1,
            task.labor_cents(),
        )?);
        if task.parts_cost_cents > 0 {
            lines.push(InvoiceLine::new(format!("Parts: {}", task.description), 1, task.parts_cost_cents)?);
        }
    }
    Ok(lines)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueSalesInvoiceCommand {
    pub sales_order_id: String,
}

impl Command for IssueSalesInvoiceCommand {
    type Output = InvoiceIssued;
}

pub struct IssueSalesInvoiceUseCase<U: UnitOfWork> {
    invoices: Arc<InvoiceRepository>,
    orders: Arc<SalesOrderRepository>,
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> IssueSalesInvoiceUseCase<U> {
    pub fn new(
        invoices: Arc<InvoiceRepository>,
        orders: Arc<SalesOrderRepository>,
        vehicles: Arc<VehicleRepository>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            invoices,
            orders,
            vehicles,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: IssueSalesInvoiceCommand, ctx: ExecutionContext) -> UseCaseResult<InvoiceIssued> {
        let order = try_use_case!(load_order(&self.orders, &command.sales_order_id).await);
        if order.status != SalesOrderStatus::Confirmed {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "ORDER_NOT_CONFIRMED",
                format!("Only confirmed orders can be invoiced; this one is {}", order.status.as_str()),
            ));
        }
        try_use_case!(ensure_not_invoiced(&self.invoices, InvoiceSource::SalesOrder, &order.id).await);

        let title = match try_use_case!(self.vehicles.find_by_id(&order.vehicle_id).await) {
            Some(vehicle) => format!("{} (VIN {})", vehicle.title(), vehicle.vin),
            None => format!("Vehicle {}", order.vehicle_id),
        };
        let lines = try_use_case!(sales_lines(&order, &title));
        let invoice = try_use_case!(Invoice::issue(
            order.customer_id.as_str(),
            InvoiceSource::SalesOrder,
            order.id.as_str(),
            lines,
            order.tax_rate_bps,
        ));

        let event = InvoiceIssued::new(&ctx, &invoice);
        self.unit_of_work.commit(&invoice, event, &command).await
    }
}

crate::impl_command_handler!(IssueSalesInvoiceUseCase, IssueSalesInvoiceCommand);

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueServiceInvoiceCommand {
    pub service_order_id: String,
    #[serde(default)]
    pub tax_rate_bps: u32,
}

impl Command for IssueServiceInvoiceCommand {
    type Output = InvoiceIssued;
}

pub struct IssueServiceInvoiceUseCase<U: UnitOfWork> {
    invoices: Arc<InvoiceRepository>,
    service_orders: Arc<ServiceOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> IssueServiceInvoiceUseCase<U> {
    pub fn new(invoices: Arc<InvoiceRepository>, service_orders: Arc<ServiceOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            invoices,
            service_orders,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: IssueServiceInvoiceCommand, ctx: ExecutionContext) -> UseCaseResult<InvoiceIssued> {
        try_use_case!(dl_common::money::validate_rate(command.tax_rate_bps));

        let order = try_use_case!(load_service_order(&self.service_orders, &command.service_order_id).await);
        if order.status != ServiceOrderStatus::Completed {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "SERVICE_ORDER_NOT_COMPLETED",
                format!("Only completed service orders can be invoiced; this one is {}", order.status.as_str()),
            ));
        }
        try_use_case!(ensure_not_invoiced(&self.invoices, InvoiceSource::ServiceOrder, &order.id).await);

        let lines = try_use_case!(service_lines(&order));
        let invoice = try_use_case!(Invoice::issue(
            order.customer_id.as_str(),
            InvoiceSource::ServiceOrder,
            order.id.as_str(),
            lines,
            command.tax_rate_bps,
        ));

        let event = InvoiceIssued::new(&ctx, &invoice);
        self.unit_of_work.commit(&invoice, event, &command).await
    }
}

crate::impl_command_handler!(IssueServiceInvoiceUseCase, IssueServiceInvoiceCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_vehicle, Memory};

    #[tokio::test]
    async fn test_sales_invoice_matches_order_totals() {
        let mem = Memory::new();
        let invoices = Arc::new(InvoiceRepository::new(mem.dyn_store()));
        let orders = Arc::new(SalesOrderRepository::new(mem.dyn_store()));
        let vehicles = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;

        let mut order = SalesOrder::new("C1", vehicle.id.as_str(), "staff-1", vehicle.price_cents, 825).unwrap();
        order.set_pricing(vehicle.price_cents, 100_000, 250_000, 825).unwrap();
        mem.put(&order).await;

        let uc = IssueSalesInvoiceUseCase::new(invoices.clone(), orders.clone(), vehicles, mem.uow.clone());
        let cmd = IssueSalesInvoiceCommand {
            sales_order_id: order.id.clone(),
        };
        assert_eq!(uc.execute(cmd.clone(), ctx()).await.unwrap_err().code(), "ORDER_NOT_CONFIRMED");

        order.confirm();
        mem.put(&order).await;
        let event = uc.execute(cmd.clone(), ctx()).await.unwrap();

        let invoice = invoices.find_by_id(&event.invoice_id).await.unwrap().unwrap();
        assert_eq!(invoice.lines.len(), 3);
        assert!(invoice.lines[0].description.contains("Toyota Corolla"));
        assert_eq!(invoice.subtotal_cents, order.subtotal_cents);
        assert_eq!(invoice.total_cents, order.total_cents);
        assert_eq!(invoice.customer_id, "C1");

        assert_eq!(uc.execute(cmd, ctx()).await.unwrap_err().code(), "ALREADY_INVOICED");
    }

    #[tokio::test]
    async fn test_service_invoice_lines() {
        let mem = Memory::new();
        let invoices = Arc::new(InvoiceRepository::new(mem.dyn_store()));
        let service_orders = Arc::new(ServiceOrderRepository::new(mem.dyn_store()));

        let mut order = ServiceOrder::open("C1", "2T1BURHE0JC074587", "Brakes squeal");
        order.add_task("Replace pads", 15, 10_000, 8_000);
        order.add_task("Inspect rotors", 5, 10_000, 0);
        mem.put(&order).await;

        let uc = IssueServiceInvoiceUseCase::new(invoices.clone(), service_orders, mem.uow.clone());
        let cmd = IssueServiceInvoiceCommand {
            service_order_id: order.id.clone(),
            tax_rate_bps: 1_000,
        };
        assert_eq!(uc.execute(cmd.clone(), ctx()).await.unwrap_err().code(), "SERVICE_ORDER_NOT_COMPLETED");

        order.status = ServiceOrderStatus::Completed;
        mem.put(&order).await;
        let event = uc.execute(cmd, ctx()).await.unwrap();

        let invoice = invoices.find_by_id(&event.invoice_id).await.unwrap().unwrap();
        // labor 150.00 + parts 80.00 + labor 50.00
        assert_eq!(invoice.lines.len(), 3);
        assert_eq!(invoice.lines[0].description, "Labor: Replace pads (1.5 h)");
        assert_eq!(invoice.subtotal_cents, 28_000);
        assert_eq!(invoice.tax_cents, 2_800);
        assert_eq!(invoice.source_type, InvoiceSource::ServiceOrder);
    }
}
