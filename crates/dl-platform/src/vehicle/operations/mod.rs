//! Vehicle Operations

pub mod availability;
pub mod create;
pub mod events;
pub mod update;

pub use availability::{
    DeleteVehicleCommand, DeleteVehicleUseCase, SetVehicleAvailabilityCommand, SetVehicleAvailabilityUseCase,
};
pub use create::{CreateVehicleCommand, CreateVehicleUseCase};
pub use events::*;
pub use update::{UpdateVehicleCommand, UpdateVehicleUseCase};

use super::entity::Vehicle;
use super::repository::VehicleRepository;
use crate::usecase::UseCaseError;

/// Fetch a vehicle or fail with `VEHICLE_NOT_FOUND`.
pub(crate) async fn load_vehicle(vehicles: &VehicleRepository, id: &str) -> Result<Vehicle, UseCaseError> {
    vehicles
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("VEHICLE_NOT_FOUND", format!("Vehicle '{}' not found", id)))
}
