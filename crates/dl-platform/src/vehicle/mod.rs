//! Vehicle inventory.

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{Vehicle, VehicleCondition, VehicleStatus};
pub use repository::{VehicleFilter, VehicleRepository};

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{GetVehicleQuery, ListVehiclesQuery, VehicleQueries};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    let vehicles = &repos.vehicles;
    mediator.register_command::<CreateVehicleCommand, _>(Arc::new(CreateVehicleUseCase::new(
        vehicles.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<UpdateVehicleCommand, _>(Arc::new(UpdateVehicleUseCase::new(
        vehicles.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<SetVehicleAvailabilityCommand, _>(Arc::new(
        SetVehicleAvailabilityUseCase::new(vehicles.clone(), unit_of_work.clone()),
    ));
    mediator.register_command::<DeleteVehicleCommand, _>(Arc::new(DeleteVehicleUseCase::new(
        vehicles.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(VehicleQueries::new(vehicles.clone()));
    mediator.register_query::<GetVehicleQuery, _>(queries.clone());
    mediator.register_query::<ListVehiclesQuery, _>(queries);
}
