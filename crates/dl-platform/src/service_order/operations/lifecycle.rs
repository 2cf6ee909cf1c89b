//! Start / Complete / Cancel Service Order Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::events::ServiceOrderStatusChanged;
use super::{load_service_order, require_status};
use crate::mediator::Command;
use crate::service_order::entity::{ServiceOrder, ServiceOrderStatus};
use crate::service_order::repository::ServiceOrderRepository;
use crate::shared::validation::optional;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, SerializableAggregate, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::entity::VehicleStatus;
use crate::vehicle::repository::VehicleRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartServiceOrderCommand {
    pub service_order_id: String,
}

impl Command for StartServiceOrderCommand {
    type Output = ServiceOrderStatusChanged;
}

pub struct StartServiceOrderUseCase<U: UnitOfWork> {
    service_orders: Arc<ServiceOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> StartServiceOrderUseCase<U> {
    pub fn new(service_orders: Arc<ServiceOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            service_orders,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: StartServiceOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<ServiceOrderStatusChanged> {
        let mut order = try_use_case!(load_service_order(&self.service_orders, &command.service_order_id).await);
        try_use_case!(require_status(&order, &[ServiceOrderStatus::Open], ServiceOrderStatus::InProgress));

        if order.technician_id.is_none() {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "TECHNICIAN_REQUIRED",
                "Assign a technician before starting work",
            ));
        }
        if order.tasks.is_empty() {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "NO_TASKS",
                "Add at least one task before starting work",
            ));
        }

        let previous = order.status;
        order.start();

        let event = ServiceOrderStatusChanged::new(&ctx, &order, previous);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(StartServiceOrderUseCase, StartServiceOrderCommand);

/// Loads the inventory vehicle of a closing order and returns it to the lot.
/// Vehicles that left `IN_SERVICE` some other way are left alone.
async fn release_vehicle(
    vehicles: &VehicleRepository,
    order: &ServiceOrder,
) -> Result<Option<Box<dyn SerializableAggregate>>, UseCaseError> {
    let Some(ref vehicle_id) = order.vehicle_id else {
        return Ok(None);
    };
    match vehicles.find_by_id(vehicle_id).await? {
        Some(mut vehicle) if vehicle.status == VehicleStatus::InService => {
            vehicle.status = VehicleStatus::Available;
            vehicle.touch();
            Ok(Some(Box::new(vehicle)))
        }
        Some(_) => Ok(None),
        None => {
            warn!(order_id = %order.id, vehicle_id = %vehicle_id, "Service order references a missing vehicle");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteServiceOrderCommand {
    pub service_order_id: String,
}

impl Command for CompleteServiceOrderCommand {
    type Output = ServiceOrderStatusChanged;
}

pub struct CompleteServiceOrderUseCase<U: UnitOfWork> {
    service_orders: Arc<ServiceOrderRepository>,
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CompleteServiceOrderUseCase<U> {
    pub fn new(
        service_orders: Arc<ServiceOrderRepository>,
        vehicles: Arc<VehicleRepository>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            service_orders,
            vehicles,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CompleteServiceOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<ServiceOrderStatusChanged> {
        let mut order = try_use_case!(load_service_order(&self.service_orders, &command.service_order_id).await);
        try_use_case!(require_status(&order, &[ServiceOrderStatus::InProgress], ServiceOrderStatus::Completed));

        let previous = order.status;
        order.complete();
        let vehicle = try_use_case!(release_vehicle(&self.vehicles, &order).await);

        let event = ServiceOrderStatusChanged::new(&ctx, &order, previous);
        let mut aggregates: Vec<Box<dyn SerializableAggregate>> = vec![Box::new(order)];
        aggregates.extend(vehicle);
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(CompleteServiceOrderUseCase, CompleteServiceOrderCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelServiceOrderCommand {
    pub service_order_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Command for CancelServiceOrderCommand {
    type Output = ServiceOrderStatusChanged;
}

pub struct CancelServiceOrderUseCase<U: UnitOfWork> {
    service_orders: Arc<ServiceOrderRepository>,
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CancelServiceOrderUseCase<U> {
    pub fn new(
        service_orders: Arc<ServiceOrderRepository>,
        vehicles: Arc<VehicleRepository>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            service_orders,
            vehicles,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CancelServiceOrderCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<ServiceOrderStatusChanged> {
        let mut order = try_use_case!(load_service_order(&self.service_orders, &command.service_order_id).await);
        try_use_case!(require_status(&order, &ServiceOrderStatus::ACTIVE, ServiceOrderStatus::Cancelled));

        let previous = order.status;
        order.cancel(optional(command.reason.as_deref()));
        let vehicle = try_use_case!(release_vehicle(&self.vehicles, &order).await);

        let event = ServiceOrderStatusChanged::new(&ctx, &order, previous);
        let mut aggregates: Vec<Box<dyn SerializableAggregate>> = vec![Box::new(order)];
        aggregates.extend(vehicle);
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(CancelServiceOrderUseCase, CancelServiceOrderCommand);
