//! Create Vehicle Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::VehicleCreated;
use crate::mediator::Command;
use crate::shared::validation::{optional, required};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::entity::{normalize_vin, validate_price, validate_year, Vehicle, VehicleCondition};
use crate::vehicle::repository::VehicleRepository;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleCommand {
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub mileage: i64,
    pub condition: VehicleCondition,
    pub price_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl Command for CreateVehicleCommand {
    type Output = VehicleCreated;
}

pub struct CreateVehicleUseCase<U: UnitOfWork> {
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CreateVehicleUseCase<U> {
    pub fn new(vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self { vehicles, unit_of_work }
    }

    pub async fn execute(&self, command: CreateVehicleCommand, ctx: ExecutionContext) -> UseCaseResult<VehicleCreated> {
        let vin = try_use_case!(normalize_vin(&command.vin));
        let make = try_use_case!(required(&command.make, "MAKE_REQUIRED", "Make"));
        let model = try_use_case!(required(&command.model, "MODEL_REQUIRED", "Model"));
        let year = try_use_case!(validate_year(command.year));
        let price = try_use_case!(validate_price(command.price_cents));
        if command.mileage < 0 {
            return UseCaseResult::failure(UseCaseError::validation(
                "INVALID_MILEAGE",
                "Mileage must not be negative",
            ));
        }

        if try_use_case!(self.vehicles.exists_by_vin(&vin).await) {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "VIN_EXISTS",
                format!("A vehicle with VIN {} is already in inventory", vin),
            ));
        }

        let mut vehicle = Vehicle::new(vin, make, model, year, command.condition, price);
        vehicle.trim = optional(command.trim.as_deref());
        vehicle.color = optional(command.color.as_deref());
        vehicle.mileage = command.mileage;
        vehicle.description = optional(command.description.as_deref());
        vehicle.features = command.features.iter().filter_map(|f| optional(Some(f.as_str()))).collect();
        vehicle.image_urls = command.image_urls.iter().filter_map(|u| optional(Some(u.as_str()))).collect();

        let event = VehicleCreated::new(&ctx, &vehicle);
        self.unit_of_work.commit(&vehicle, event, &command).await
    }
}

crate::impl_command_handler!(CreateVehicleUseCase, CreateVehicleCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, Memory};

    fn command(vin: &str) -> CreateVehicleCommand {
        CreateVehicleCommand {
            vin: vin.into(),
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2022,
            trim: Some("LE".into()),
            color: Some(" ".into()),
            mileage: 12_000,
            condition: VehicleCondition::Used,
            price_cents: 1_899_900,
            description: None,
            features: vec!["Bluetooth".into(), "".into()],
            image_urls: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_vehicle() {
        let mem = Memory::new();
        let repo = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let uc = CreateVehicleUseCase::new(repo.clone(), mem.uow.clone());

        let event = uc.execute(command("2t1burhe0jc074587"), ctx()).await.unwrap();
        assert_eq!(event.vin, "2T1BURHE0JC074587");
        assert!(event.stock_number.starts_with("STK-"));

        let stored = repo.find_by_id(&event.vehicle_id).await.unwrap().unwrap();
        assert!(stored.is_available());
        assert_eq!(stored.color, None);
        assert_eq!(stored.features, vec!["Bluetooth".to_string()]);

        let dup = uc.execute(command("2T1BURHE0JC074587"), ctx()).await;
        assert_eq!(dup.unwrap_err().code(), "VIN_EXISTS");
    }

    #[tokio::test]
    async fn test_validation() {
        let mem = Memory::new();
        let uc = CreateVehicleUseCase::new(Arc::new(VehicleRepository::new(mem.dyn_store())), mem.uow.clone());

        let mut bad_price = command("2T1BURHE0JC074587");
        bad_price.price_cents = 0;
        assert_eq!(uc.execute(bad_price, ctx()).await.unwrap_err().code(), "INVALID_PRICE");

        let mut bad_year = command("2T1BURHE0JC074587");
        bad_year.year = 1850;
        assert_eq!(uc.execute(bad_year, ctx()).await.unwrap_err().code(), "INVALID_YEAR");

        assert_eq!(uc.execute(command("SHORT"), ctx()).await.unwrap_err().code(), "INVALID_VIN");
        assert_eq!(mem.event_count("vehicle:created").await, 0);
    }
}
