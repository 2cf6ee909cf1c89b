//! Open Service Order Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::ServiceOrderOpened;
use crate::customer::operations::load_customer;
use crate::customer::repository::CustomerRepository;
use crate::details;
use crate::mediator::Command;
use crate::service_order::entity::ServiceOrder;
use crate::service_order::repository::ServiceOrderRepository;
use crate::shared::validation::{optional, required};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, SerializableAggregate, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::entity::{normalize_vin, VehicleStatus};
use crate::vehicle::operations::load_vehicle;
use crate::vehicle::repository::VehicleRepository;

/// Opens a repair order. With `vehicle_id` the car is dealer inventory and
/// its VIN comes from the vehicle record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenServiceOrderCommand {
    pub customer_id: String,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    pub complaint: String,
}

impl Command for OpenServiceOrderCommand {
    type Output = ServiceOrderOpened;
}

pub struct OpenServiceOrderUseCase<U: UnitOfWork> {
    customers: Arc<CustomerRepository>,
    vehicles: Arc<VehicleRepository>,
    service_orders: Arc<ServiceOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> OpenServiceOrderUseCase<U> {
    pub fn new(
        customers: Arc<CustomerRepository>,
        vehicles: Arc<VehicleRepository>,
        service_orders: Arc<ServiceOrderRepository>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            customers,
            vehicles,
            service_orders,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: OpenServiceOrderCommand, ctx: ExecutionContext) -> UseCaseResult<ServiceOrderOpened> {
        let complaint = try_use_case!(required(&command.complaint, "COMPLAINT_REQUIRED", "Complaint"));
        let customer = try_use_case!(load_customer(&self.customers, &command.customer_id).await);
        let vin = match optional(command.vin.as_deref()) {
            Some(raw) => Some(try_use_case!(normalize_vin(&raw))),
            None => None,
        };

        let Some(vehicle_id) = optional(command.vehicle_id.as_deref()) else {
            let Some(vin) = vin else {
                return UseCaseResult::failure(UseCaseError::validation(
                    "VIN_REQUIRED",
                    "A VIN or an inventory vehicle is required",
                ));
            };
            let order = ServiceOrder::open(customer.id, vin, complaint);
            let event = ServiceOrderOpened::new(&ctx, &order);
            return self.unit_of_work.commit(&order, event, &command).await;
        };

        let mut vehicle = try_use_case!(load_vehicle(&self.vehicles, &vehicle_id).await);
        if let Some(ref vin) = vin {
            if *vin != vehicle.vin {
                return UseCaseResult::failure(UseCaseError::validation_with_details(
                    "VIN_MISMATCH",
                    "VIN does not match the inventory vehicle",
                    details! { "vin" => vin.as_str(), "vehicleVin" => vehicle.vin.as_str() },
                ));
            }
        }
        if let Some(existing) = try_use_case!(self.service_orders.find_active_for_vehicle(&vehicle.id).await) {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "VEHICLE_ALREADY_IN_SERVICE",
                format!("{} already has an open service order", vehicle.title()),
                details! { "serviceOrderId" => existing.id },
            ));
        }
        if vehicle.status != VehicleStatus::Available {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "VEHICLE_NOT_AVAILABLE",
                format!("{} is {} and cannot go into service", vehicle.title(), vehicle.status.as_str()),
                details! { "vehicleId" => vehicle.id, "status" => vehicle.status.as_str() },
            ));
        }

        let mut order = ServiceOrder::open(customer.id, vehicle.vin.as_str(), complaint);
        order.vehicle_id = Some(vehicle.id.clone());
        vehicle.status = VehicleStatus::InService;
        vehicle.touch();

        let event = ServiceOrderOpened::new(&ctx, &order);
        let aggregates: Vec<Box<dyn SerializableAggregate>> = vec![Box::new(order), Box::new(vehicle)];
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(OpenServiceOrderUseCase, OpenServiceOrderCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_customer, seed_vehicle, Memory};

    fn command(customer_id: &str, vin: Option<&str>, vehicle_id: Option<&str>) -> OpenServiceOrderCommand {
        OpenServiceOrderCommand {
            customer_id: customer_id.into(),
            vin: vin.map(String::from),
            vehicle_id: vehicle_id.map(String::from),
            complaint: "Pulls to the left".into(),
        }
    }

    fn use_case(mem: &Memory) -> (OpenServiceOrderUseCase<crate::usecase::InMemoryUnitOfWork>, Arc<VehicleRepository>) {
        let vehicles = Arc::new(VehicleRepository::new(mem.dyn_store()));
        let uc = OpenServiceOrderUseCase::new(
            Arc::new(CustomerRepository::new(mem.dyn_store())),
            vehicles.clone(),
            Arc::new(ServiceOrderRepository::new(mem.dyn_store())),
            mem.uow.clone(),
        );
        (uc, vehicles)
    }

    #[tokio::test]
    async fn test_open_for_customer_car() {
        let mem = Memory::new();
        let customer = seed_customer(&mem, "ada@example.com").await;
        let (uc, _) = use_case(&mem);

        let event = uc
            .execute(command(&customer.id, Some("1hgcm82633a004352"), None), ctx())
            .await
            .unwrap();
        assert_eq!(event.vin, "1HGCM82633A004352");
        assert!(event.vehicle_id.is_none());

        let missing = uc.execute(command(&customer.id, None, None), ctx()).await;
        assert_eq!(missing.unwrap_err().code(), "VIN_REQUIRED");
    }

    #[tokio::test]
    async fn test_open_for_inventory_vehicle_puts_it_in_service() {
        let mem = Memory::new();
        let customer = seed_customer(&mem, "ada@example.com").await;
        let vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;
        let (uc, vehicles) = use_case(&mem);

        let event = uc.execute(command(&customer.id, None, Some(&vehicle.id)), ctx()).await.unwrap();
        assert_eq!(event.vin, vehicle.vin);
        let stored = vehicles.find_by_id(&vehicle.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VehicleStatus::InService);

        let again = uc.execute(command(&customer.id, None, Some(&vehicle.id)), ctx()).await;
        assert_eq!(again.unwrap_err().code(), "VEHICLE_ALREADY_IN_SERVICE");
    }

    #[tokio::test]
    async fn test_vin_must_match_inventory_vehicle() {
        let mem = Memory::new();
        let customer = seed_customer(&mem, "ada@example.com").await;
        let vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;
        let (uc, _) = use_case(&mem);

        let result = uc
            .execute(command(&customer.id, Some("1HGCM82633A004352"), Some(&vehicle.id)), ctx())
            .await;
        assert_eq!(result.unwrap_err().code(), "VIN_MISMATCH");
    }
}
