//! Set Vehicle Availability / Delete Vehicle Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::{VehicleAvailabilityChanged, VehicleDeleted};
use super::load_vehicle;
use crate::details;
use crate::mediator::Command;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::entity::VehicleStatus;
use crate::vehicle::repository::VehicleRepository;

/// States staff may toggle by hand. `RESERVED` and `SOLD` belong to sales orders.
fn is_lot_status(status: VehicleStatus) -> bool {
    matches!(status, VehicleStatus::Available | VehicleStatus::InService)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetVehicleAvailabilityCommand {
    pub vehicle_id: String,
    pub status: VehicleStatus,
}

impl Command for SetVehicleAvailabilityCommand {
    type Output = VehicleAvailabilityChanged;
}

pub struct SetVehicleAvailabilityUseCase<U: UnitOfWork> {
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> SetVehicleAvailabilityUseCase<U> {
    pub fn new(vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self { vehicles, unit_of_work }
    }

    pub async fn execute(
        &self,
        command: SetVehicleAvailabilityCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<VehicleAvailabilityChanged> {
        if !is_lot_status(command.status) {
            return UseCaseResult::failure(UseCaseError::validation(
                "INVALID_STATUS",
                "Availability can only be set to AVAILABLE or IN_SERVICE",
            ));
        }

        let mut vehicle = try_use_case!(load_vehicle(&self.vehicles, &command.vehicle_id).await);
        let previous = vehicle.status;

        if !is_lot_status(previous) {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "VEHICLE_LOCKED",
                "Reserved and sold vehicles are managed by their sales order",
                details! { "vehicleId" => vehicle.id, "status" => previous.as_str() },
            ));
        }
        if previous == command.status {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "STATUS_UNCHANGED",
                format!("Vehicle is already {}", previous.as_str()),
            ));
        }

        vehicle.status = command.status;
        vehicle.touch();

        let event = VehicleAvailabilityChanged::new(&ctx, &vehicle, previous);
        self.unit_of_work.commit(&vehicle, event, &command).await
    }
}

crate::impl_command_handler!(SetVehicleAvailabilityUseCase, SetVehicleAvailabilityCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVehicleCommand {
    pub vehicle_id: String,
}

impl Command for DeleteVehicleCommand {
    type Output = VehicleDeleted;
}

pub struct DeleteVehicleUseCase<U: UnitOfWork> {
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> DeleteVehicleUseCase<U> {
    pub fn new(vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self { vehicles, unit_of_work }
    }

    pub async fn execute(&self, command: DeleteVehicleCommand, ctx: ExecutionContext) -> UseCaseResult<VehicleDeleted> {
        let vehicle = try_use_case!(load_vehicle(&self.vehicles, &command.vehicle_id).await);

        if !is_lot_status(vehicle.status) {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "VEHICLE_NOT_DELETABLE",
                format!("A {} vehicle cannot be deleted", vehicle.status.as_str()),
            ));
        }

        let event = VehicleDeleted::new(&ctx, &vehicle);
        self.unit_of_work.commit_delete(&vehicle, event, &command).await
    }
}

crate::impl_command_handler!(DeleteVehicleUseCase, DeleteVehicleCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_vehicle, Memory};

    #[tokio::test]
    async fn test_toggle_between_lot_states() {
        let mem = Memory::new();
        let repo = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;
        let uc = SetVehicleAvailabilityUseCase::new(repo.clone(), mem.uow.clone());

        let to_service = SetVehicleAvailabilityCommand {
            vehicle_id: vehicle.id.clone(),
            status: VehicleStatus::InService,
        };
        let event = uc.execute(to_service.clone(), ctx()).await.unwrap();
        assert_eq!(event.previous_status, VehicleStatus::Available);
        assert_eq!(uc.execute(to_service, ctx()).await.unwrap_err().code(), "STATUS_UNCHANGED");

        let to_sold = SetVehicleAvailabilityCommand {
            vehicle_id: vehicle.id.clone(),
            status: VehicleStatus::Sold,
        };
        assert_eq!(uc.execute(to_sold, ctx()).await.unwrap_err().code(), "INVALID_STATUS");
    }

    #[tokio::test]
    async fn test_reserved_vehicle_is_locked() {
        let mem = Memory::new();
        let repo = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let mut vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;
        vehicle.reserve("SO1");
        mem.put(&vehicle).await;

        let toggle = SetVehicleAvailabilityUseCase::new(repo.clone(), mem.uow.clone());
        let command = SetVehicleAvailabilityCommand {
            vehicle_id: vehicle.id.clone(),
            status: VehicleStatus::InService,
        };
        assert_eq!(toggle.execute(command, ctx()).await.unwrap_err().code(), "VEHICLE_LOCKED");

        let delete = DeleteVehicleUseCase::new(repo.clone(), mem.uow.clone());
        let command = DeleteVehicleCommand { vehicle_id: vehicle.id.clone() };
        assert_eq!(delete.execute(command, ctx()).await.unwrap_err().code(), "VEHICLE_NOT_DELETABLE");
    }

    #[tokio::test]
    async fn test_delete_available_vehicle() {
        let mem = Memory::new();
        let repo = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;

        let delete = DeleteVehicleUseCase::new(repo.clone(), mem.uow.clone());
        delete.execute(DeleteVehicleCommand { vehicle_id: vehicle.id.clone() }, ctx()).await.unwrap();
        assert!(repo.find_by_id(&vehicle.id).await.unwrap().is_none());
        assert_eq!(mem.event_count("vehicle:deleted").await, 1);
    }
}
