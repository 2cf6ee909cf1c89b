//! Update Vehicle Use Case
//!
//! Edits listing details. The VIN is fixed once created; sold vehicles are
//! not editable at all.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::events::VehicleUpdated;
use super::load_vehicle;
use crate::mediator::Command;
use crate::shared::validation::{optional, required};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::entity::{validate_price, validate_year, VehicleCondition, VehicleStatus};
use crate::vehicle::repository::VehicleRepository;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleCommand {
    pub vehicle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<VehicleCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
}

impl Command for UpdateVehicleCommand {
    type Output = VehicleUpdated;
}

pub struct UpdateVehicleUseCase<U: UnitOfWork> {
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> UpdateVehicleUseCase<U> {
    pub fn new(vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self { vehicles, unit_of_work }
    }

    pub async fn execute(&self, command: UpdateVehicleCommand, ctx: ExecutionContext) -> UseCaseResult<VehicleUpdated> {
        let mut vehicle = try_use_case!(load_vehicle(&self.vehicles, &command.vehicle_id).await);

        if vehicle.status == VehicleStatus::Sold {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "VEHICLE_SOLD",
                "Sold vehicles cannot be modified",
            ));
        }

        if let Some(make) = &command.make {
            vehicle.make = try_use_case!(required(make, "MAKE_REQUIRED", "Make"));
        }
        if let Some(model) = &command.model {
            vehicle.model = try_use_case!(required(model, "MODEL_REQUIRED", "Model"));
        }
        if let Some(year) = command.year {
            vehicle.year = try_use_case!(validate_year(year));
        }
        if let Some(mileage) = command.mileage {
            if mileage < 0 {
                return UseCaseResult::failure(UseCaseError::validation(
                    "INVALID_MILEAGE",
                    "Mileage must not be negative",
                ));
            }
            vehicle.mileage = mileage;
        }
        if let Some(condition) = command.condition {
            vehicle.condition = condition;
        }
        if command.trim.is_some() {
            vehicle.trim = optional(command.trim.as_deref());
        }
        if command.color.is_some() {
            vehicle.color = optional(command.color.as_deref());
        }
        if command.description.is_some() {
            vehicle.description = optional(command.description.as_deref());
        }
        if let Some(features) = &command.features {
            vehicle.features = features.iter().filter_map(|f| optional(Some(f.as_str()))).collect();
        }
        if let Some(urls) = &command.image_urls {
            vehicle.image_urls = urls.iter().filter_map(|u| optional(Some(u.as_str()))).collect();
        }

        let mut previous_price = None;
        if let Some(price) = command.price_cents {
            let price = try_use_case!(validate_price(price));
            if price != vehicle.price_cents {
                previous_price = Some(vehicle.price_cents);
                vehicle.price_cents = price;
            }
        }

        vehicle.touch();
        let event = VehicleUpdated::new(&ctx, &vehicle, previous_price);
        self.unit_of_work.commit(&vehicle, event, &command).await
    }
}

crate::impl_command_handler!(UpdateVehicleUseCase, UpdateVehicleCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_vehicle, Memory};

    #[tokio::test]
    async fn test_update_price_and_details() {
        let mem = Memory::new();
        let repo = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;
        let uc = UpdateVehicleUseCase::new(repo.clone(), mem.uow.clone());

        let command = UpdateVehicleCommand {
            vehicle_id: vehicle.id.clone(),
            price_cents: Some(1_750_000),
            color: Some("Blue".into()),
            ..Default::default()
        };
        let event = uc.execute(command, ctx()).await.unwrap();
        assert_eq!(event.previous_price_cents, Some(vehicle.price_cents));

        let stored = repo.find_by_id(&vehicle.id).await.unwrap().unwrap();
        assert_eq!(stored.price_cents, 1_750_000);
        assert_eq!(stored.color.as_deref(), Some("Blue"));
        assert_eq!(stored.vin, vehicle.vin);
    }

    #[tokio::test]
    async fn test_sold_vehicle_is_immutable() {
        let mem = Memory::new();
        let repo = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let mut vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;
        vehicle.mark_sold();
        mem.put(&vehicle).await;

        let uc = UpdateVehicleUseCase::new(repo, mem.uow.clone());
        let command = UpdateVehicleCommand {
            vehicle_id: vehicle.id.clone(),
            mileage: Some(10),
            ..Default::default()
        };
        assert_eq!(uc.execute(command, ctx()).await.unwrap_err().code(), "VEHICLE_SOLD");
    }
}
