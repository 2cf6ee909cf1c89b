//! Test drives, consultations, drop-offs and deliveries.

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{Appointment, AppointmentKind, AppointmentStatus};
pub use repository::{AppointmentFilter, AppointmentRepository};

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{AppointmentQueries, GetAppointmentQuery, ListAppointmentsQuery};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    let appointments = &repos.appointments;
    mediator.register_command::<ScheduleAppointmentCommand, _>(Arc::new(ScheduleAppointmentUseCase::new(
        appointments.clone(),
        repos.customers.clone(),
        repos.vehicles.clone(),
        repos.users.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<RescheduleAppointmentCommand, _>(Arc::new(RescheduleAppointmentUseCase::new(
        appointments.clone(),
        repos.vehicles.clone(),
        repos.users.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<ConfirmAppointmentCommand, _>(Arc::new(ConfirmAppointmentUseCase::new(
        appointments.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<CompleteAppointmentCommand, _>(Arc::new(CompleteAppointmentUseCase::new(
        appointments.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<CancelAppointmentCommand, _>(Arc::new(CancelAppointmentUseCase::new(
        appointments.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<MarkNoShowCommand, _>(Arc::new(MarkNoShowUseCase::new(
        appointments.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(AppointmentQueries::new(appointments.clone()));
    mediator.register_query::<GetAppointmentQuery, _>(queries.clone());
    mediator.register_query::<ListAppointmentsQuery, _>(queries);
}
