//! Create / Update Purchase Order Use Cases

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::{PurchaseOrderCreated, PurchaseOrderUpdated};
use super::load_purchase_order;
use crate::details;
use crate::mediator::Command;
use crate::purchase_order::entity::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
use crate::purchase_order::repository::PurchaseOrderRepository;
use crate::shared::validation::{optional, required};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::entity::{normalize_vin, validate_price, validate_year, VehicleCondition};
use crate::vehicle::repository::VehicleRepository;

pub const MAX_LINES: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLineInput {
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub color: Option<String>,
    pub condition: VehicleCondition,
    pub unit_cost_cents: i64,
    pub list_price_cents: i64,
}

impl PurchaseOrderLineInput {
    fn validate(&self) -> Result<PurchaseOrderLine, UseCaseError> {
        Ok(PurchaseOrderLine {
            vin: normalize_vin(&self.vin)?,
            make: required(&self.make, "MAKE_REQUIRED", "Make")?,
            model: required(&self.model, "MODEL_REQUIRED", "Model")?,
            year: validate_year(self.year)?,
            color: optional(self.color.as_deref()),
            condition: self.condition,
            unit_cost_cents: validate_price(self.unit_cost_cents)?,
            list_price_cents: validate_price(self.list_price_cents)?,
            vehicle_id: None,
        })
    }
}

/// Validated lines: well-formed, unique VINs within the order, none already
/// in inventory or on another pending purchase order.
async fn validate_lines(
    inputs: &[PurchaseOrderLineInput],
    vehicles: &VehicleRepository,
    orders: &PurchaseOrderRepository,
    order_id: Option<&str>,
) -> Result<Vec<PurchaseOrderLine>, UseCaseError> {
    if inputs.is_empty() {
        return Err(UseCaseError::validation("NO_LINES", "A purchase order needs at least one vehicle"));
    }
    if inputs.len() > MAX_LINES {
        return Err(UseCaseError::validation(
            "TOO_MANY_LINES",
            format!("A purchase order holds at most {} vehicles", MAX_LINES),
        ));
    }

    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(inputs.len());
    for input in inputs {
        let line = input.validate()?;
        if !seen.insert(line.vin.clone()) {
            return Err(UseCaseError::validation_with_details(
                "DUPLICATE_VIN",
                format!("VIN {} appears more than once", line.vin),
                details! { "vin" => line.vin },
            ));
        }
        lines.push(line);
    }

    for line in &lines {
        if vehicles.exists_by_vin(&line.vin).await? {
            return Err(UseCaseError::business_rule_with_details(
                "VIN_EXISTS",
                format!("VIN {} is already in inventory", line.vin),
                details! { "vin" => line.vin.as_str() },
            ));
        }
        if let Some(other) = orders.find_pending_with_vin(&line.vin, order_id).await? {
            return Err(UseCaseError::business_rule_with_details(
                "VIN_ON_ORDER",
                format!("VIN {} is already on purchase order {}", line.vin, other.order_number),
                details! { "vin" => line.vin.as_str(), "purchaseOrderId" => other.id },
            ));
        }
    }
    Ok(lines)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderCommand {
    pub supplier: String,
    pub lines: Vec<PurchaseOrderLineInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Command for CreatePurchaseOrderCommand {
    type Output = PurchaseOrderCreated;
}

pub struct CreatePurchaseOrderUseCase<U: UnitOfWork> {
    orders: Arc<PurchaseOrderRepository>,
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CreatePurchaseOrderUseCase<U> {
    pub fn new(orders: Arc<PurchaseOrderRepository>, vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            orders,
            vehicles,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CreatePurchaseOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<PurchaseOrderCreated> {
        let supplier = try_use_case!(required(&command.supplier, "SUPPLIER_REQUIRED", "Supplier"));
        let lines = try_use_case!(validate_lines(&command.lines, &self.vehicles, &self.orders, None).await);

        let mut order = try_use_case!(PurchaseOrder::new(supplier, lines, ctx.principal_id.as_str()));
        order.notes = optional(command.notes.as_deref());

        let event = PurchaseOrderCreated::new(&ctx, &order);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(CreatePurchaseOrderUseCase, CreatePurchaseOrderCommand);

/// Edit a draft. Absent fields keep their current value; `lines` replaces all lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePurchaseOrderCommand {
    #[serde(default)]
    pub order_id: String,
    pub supplier: Option<String>,
    pub lines: Option<Vec<PurchaseOrderLineInput>>,
    pub notes: Option<String>,
}

impl Command for UpdatePurchaseOrderCommand {
    type Output = PurchaseOrderUpdated;
}

pub struct UpdatePurchaseOrderUseCase<U: UnitOfWork> {
    orders: Arc<PurchaseOrderRepository>,
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> UpdatePurchaseOrderUseCase<U> {
    pub fn new(orders: Arc<PurchaseOrderRepository>, vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            orders,
            vehicles,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: UpdatePurchaseOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<PurchaseOrderUpdated> {
        let mut order = try_use_case!(load_purchase_order(&self.orders, &command.order_id).await);
        if order.status != PurchaseOrderStatus::Draft {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "ORDER_NOT_DRAFT",
                format!("Only draft purchase orders can be edited; this one is {}", order.status.as_str()),
            ));
        }

        let previous_total = order.total_cost_cents;
        if let Some(ref supplier) = command.supplier {
            order.supplier = try_use_case!(required(supplier, "SUPPLIER_REQUIRED", "Supplier"));
        }
        if let Some(ref inputs) = command.lines {
            let lines = try_use_case!(validate_lines(inputs, &self.vehicles, &self.orders, Some(&order.id)).await);
            try_use_case!(order.set_lines(lines));
        }
        if command.notes.is_some() {
            order.notes = optional(command.notes.as_deref());
        }
        order.touch();

        let event = PurchaseOrderUpdated::new(&ctx, &order, previous_total);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(UpdatePurchaseOrderUseCase, UpdatePurchaseOrderCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_vehicle, Memory};

    fn input(vin: &str) -> PurchaseOrderLineInput {
        PurchaseOrderLineInput {
            vin: vin.into(),
            make: "Mazda".into(),
            model: "CX-5".into(),
            year: 2024,
            color: None,
            condition: VehicleCondition::New,
            unit_cost_cents: 2_800_000,
            list_price_cents: 3_200_000,
        }
    }

    fn create(lines: Vec<PurchaseOrderLineInput>) -> CreatePurchaseOrderCommand {
        CreatePurchaseOrderCommand {
            supplier: "Mazda Distribution".into(),
            lines,
            notes: None,
        }
    }

    fn use_cases(mem: &Memory) -> (
        CreatePurchaseOrderUseCase<crate::usecase::InMemoryUnitOfWork>,
        UpdatePurchaseOrderUseCase<crate::usecase::InMemoryUnitOfWork>,
    ) {
        let orders = Arc::new(PurchaseOrderRepository::new(mem.dyn_store()));
        let vehicles = Arc::new(VehicleRepository::new(mem.dyn_store()));
        (
            CreatePurchaseOrderUseCase::new(orders.clone(), vehicles.clone(), mem.uow.clone()),
            UpdatePurchaseOrderUseCase::new(orders, vehicles, mem.uow.clone()),
        )
    }

    #[tokio::test]
    async fn test_create_validates_vins() {
        let mem = Memory::new();
        let (uc, _) = use_cases(&mem);
        seed_vehicle(&mem, "2T1BURHE0JC074587").await;

        let event = uc
            .execute(create(vec![input("jm3kfbcm1r0100001"), input("JM3KFBCM1R0100002")]), ctx())
            .await
            .unwrap();
        assert_eq!(event.line_count, 2);
        assert_eq!(event.total_cost_cents, 5_600_000);

        let dup = create(vec![input("JM3KFBCM1R0100003"), input("jm3kfbcm1r0100003")]);
        assert_eq!(uc.execute(dup, ctx()).await.unwrap_err().code(), "DUPLICATE_VIN");

        let stocked = create(vec![input("2T1BURHE0JC074587")]);
        assert_eq!(uc.execute(stocked, ctx()).await.unwrap_err().code(), "VIN_EXISTS");

        let on_order = create(vec![input("JM3KFBCM1R0100001")]);
        assert_eq!(uc.execute(on_order, ctx()).await.unwrap_err().code(), "VIN_ON_ORDER");

        assert_eq!(uc.execute(create(vec![]), ctx()).await.unwrap_err().code(), "NO_LINES");
    }

    #[tokio::test]
    async fn test_update_draft_only() {
        let mem = Memory::new();
        let (create_uc, update_uc) = use_cases(&mem);
        let created = create_uc
            .execute(create(vec![input("JM3KFBCM1R0100001")]), ctx())
            .await
            .unwrap();

        // Re-submitting the same VIN on the same order is not a conflict
        let cmd = UpdatePurchaseOrderCommand {
            order_id: created.order_id.clone(),
            lines: Some(vec![input("JM3KFBCM1R0100001"), input("JM3KFBCM1R0100002")]),
            ..Default::default()
        };
        let event = update_uc.execute(cmd.clone(), ctx()).await.unwrap();
        assert_eq!(event.previous_total_cost_cents, 2_800_000);
        assert_eq!(event.total_cost_cents, 5_600_000);

        let orders = PurchaseOrderRepository::new(mem.dyn_store());
        let mut order = orders.find_by_id(&created.order_id).await.unwrap().unwrap();
        order.submit();
        mem.put(&order).await;
        assert_eq!(update_uc.execute(cmd, ctx()).await.unwrap_err().code(), "ORDER_NOT_DRAFT");
    }
}
