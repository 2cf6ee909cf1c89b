//! Schedule / Reschedule Appointment Use Cases

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::{AppointmentRescheduled, AppointmentScheduled};
use super::{load_appointment, require_status, Booking, Slot};
use crate::appointment::entity::{Appointment, AppointmentKind, AppointmentStatus};
use crate::appointment::repository::AppointmentRepository;
use crate::customer::operations::load_customer;
use crate::customer::repository::CustomerRepository;
use crate::mediator::Command;
use crate::shared::validation::optional;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseResult};
use crate::user::repository::UserRepository;
use crate::vehicle::repository::VehicleRepository;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAppointmentCommand {
    #[serde(default)]
    pub customer_id: String,
    pub kind: AppointmentKind,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Command for ScheduleAppointmentCommand {
    type Output = AppointmentScheduled;
}

pub struct ScheduleAppointmentUseCase<U: UnitOfWork> {
    appointments: Arc<AppointmentRepository>,
    customers: Arc<CustomerRepository>,
    vehicles: Arc<VehicleRepository>,
    users: Arc<UserRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> ScheduleAppointmentUseCase<U> {
    pub fn new(
        appointments: Arc<AppointmentRepository>,
        customers: Arc<CustomerRepository>,
        vehicles: Arc<VehicleRepository>,
        users: Arc<UserRepository>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            appointments,
            customers,
            vehicles,
            users,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: ScheduleAppointmentCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<AppointmentScheduled> {
        let slot = try_use_case!(Slot::new(command.start_at, command.duration_minutes, Utc::now()));
        let customer = try_use_case!(load_customer(&self.customers, &command.customer_id).await);
        let staff_id = optional(command.staff_id.as_deref());
        let vehicle_id = optional(command.vehicle_id.as_deref());

        let booking = Booking {
            appointments: &self.appointments,
            vehicles: &self.vehicles,
            users: &self.users,
        };
        try_use_case!(booking.check_staff(staff_id.as_deref()).await);
        try_use_case!(booking.check_vehicle(command.kind, vehicle_id.as_deref()).await);
        try_use_case!(
            booking
                .check_conflicts(staff_id.as_deref(), vehicle_id.as_deref(), &slot, None)
                .await
        );

        let mut appt = Appointment::new(customer.id, command.kind, slot.start, slot.duration_minutes, &ctx.principal_id);
        appt.staff_id = staff_id;
        appt.vehicle_id = vehicle_id;
        appt.notes = optional(command.notes.as_deref());

        let event = AppointmentScheduled::new(&ctx, &appt);
        self.unit_of_work.commit(&appt, event, &command).await
    }
}

crate::impl_command_handler!(ScheduleAppointmentUseCase, ScheduleAppointmentCommand);

/// Moves an active appointment. `staff_id` reassigns it at the same time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentCommand {
    #[serde(default)]
    pub appointment_id: String,
    pub start_at: DateTime<Utc>,
    /// Keeps the current duration when absent
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub staff_id: Option<String>,
}

impl Command for RescheduleAppointmentCommand {
    type Output = AppointmentRescheduled;
}

pub struct RescheduleAppointmentUseCase<U: UnitOfWork> {
    appointments: Arc<AppointmentRepository>,
    vehicles: Arc<VehicleRepository>,
    users: Arc<UserRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> RescheduleAppointmentUseCase<U> {
    pub fn new(
        appointments: Arc<AppointmentRepository>,
        vehicles: Arc<VehicleRepository>,
        users: Arc<UserRepository>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            appointments,
            vehicles,
            users,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: RescheduleAppointmentCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<AppointmentRescheduled> {
        let mut appt = try_use_case!(load_appointment(&self.appointments, &command.appointment_id).await);
        try_use_case!(require_status(&appt, &AppointmentStatus::ACTIVE, AppointmentStatus::Scheduled));

        let duration = command.duration_minutes.unwrap_or(appt.duration_minutes);
        let slot = try_use_case!(Slot::new(command.start_at, duration, Utc::now()));
        let staff_id = optional(command.staff_id.as_deref()).or_else(|| appt.staff_id.clone());

        let booking = Booking {
            appointments: &self.appointments,
            vehicles: &self.vehicles,
            users: &self.users,
        };
        if staff_id != appt.staff_id {
            try_use_case!(booking.check_staff(staff_id.as_deref()).await);
        }
        try_use_case!(booking.check_vehicle(appt.kind, appt.vehicle_id.as_deref()).await);
        try_use_case!(
            booking
                .check_conflicts(staff_id.as_deref(), appt.vehicle_id.as_deref(), &slot, Some(&appt.id))
                .await
        );

        let previous_start = appt.start_at;
        appt.staff_id = staff_id;
        appt.reschedule(slot.start, slot.duration_minutes);

        let event = AppointmentRescheduled::new(&ctx, &appt, previous_start);
        self.unit_of_work.commit(&appt, event, &command).await
    }
}

crate::impl_command_handler!(RescheduleAppointmentUseCase, RescheduleAppointmentCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_customer, seed_vehicle, Memory};
    use crate::user::entity::{User, UserRole};
    use chrono::{Duration, TimeZone};

    struct Fixture {
        mem: Memory,
        customer_id: String,
        vehicle_id: String,
        staff_id: String,
    }

    async fn fixture() -> Fixture {
        let mem = Memory::new();
        let customer = seed_customer(&mem, "ada@example.com").await;
        let vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;
        let staff = User::new("sam@dealer.test", "Sam", "hash", UserRole::Sales);
        mem.put(&staff).await;
        Fixture {
            mem,
            customer_id: customer.id,
            vehicle_id: vehicle.id,
            staff_id: staff.id,
        }
    }

    fn schedule_uc(mem: &Memory) -> ScheduleAppointmentUseCase<crate::usecase::InMemoryUnitOfWork> {
        ScheduleAppointmentUseCase::new(
            Arc::new(AppointmentRepository::new(mem.dyn_store())),
            Arc::new(CustomerRepository::new(mem.dyn_store())),
            Arc::new(VehicleRepository::new(mem.dyn_store())),
            Arc::new(UserRepository::new(mem.dyn_store())),
            mem.uow.clone(),
        )
    }

    fn ten_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2099, 3, 2, 10, 0, 0).unwrap()
    }

    fn drive(f: &Fixture, start_at: DateTime<Utc>, staff: Option<&str>) -> ScheduleAppointmentCommand {
        ScheduleAppointmentCommand {
            customer_id: f.customer_id.clone(),
            kind: AppointmentKind::TestDrive,
            staff_id: staff.map(String::from),
            vehicle_id: Some(f.vehicle_id.clone()),
            start_at,
            duration_minutes: 60,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_schedule_rejects_overlap_on_vehicle() {
        let f = fixture().await;
        let uc = schedule_uc(&f.mem);

        uc.execute(drive(&f, ten_am(), Some(&f.staff_id)), ctx()).await.unwrap();

        // Same car, different salesperson, half an hour later
        let clash = uc.execute(drive(&f, ten_am() + Duration::minutes(30), None), ctx()).await;
        let err = clash.unwrap_err();
        assert_eq!(err.code(), "SLOT_UNAVAILABLE");

        // Back to back is fine
        uc.execute(drive(&f, ten_am() + Duration::minutes(60), None), ctx()).await.unwrap();
        assert_eq!(f.mem.event_count("appointment:scheduled").await, 2);
    }

    #[tokio::test]
    async fn test_schedule_validation() {
        let f = fixture().await;
        let uc = schedule_uc(&f.mem);

        let past = drive(&f, Utc::now() - Duration::hours(1), None);
        assert_eq!(uc.execute(past, ctx()).await.unwrap_err().code(), "START_IN_PAST");

        let too_long = ScheduleAppointmentCommand {
            duration_minutes: 481,
            ..drive(&f, ten_am(), None)
        };
        assert_eq!(uc.execute(too_long, ctx()).await.unwrap_err().code(), "INVALID_DURATION");

        let no_car = ScheduleAppointmentCommand {
            vehicle_id: None,
            ..drive(&f, ten_am(), None)
        };
        assert_eq!(uc.execute(no_car, ctx()).await.unwrap_err().code(), "VEHICLE_REQUIRED");

        let bad_staff = drive(&f, ten_am(), Some(&f.customer_id));
        assert_eq!(uc.execute(bad_staff, ctx()).await.unwrap_err().code(), "INVALID_STAFF");
    }

    #[tokio::test]
    async fn test_reschedule_ignores_itself() {
        let f = fixture().await;
        let appointments = Arc::new(AppointmentRepository::new(f.mem.dyn_store()));
        let event = schedule_uc(&f.mem)
            .execute(drive(&f, ten_am(), Some(&f.staff_id)), ctx())
            .await
            .unwrap();

        let uc = RescheduleAppointmentUseCase::new(
            appointments.clone(),
            Arc::new(VehicleRepository::new(f.mem.dyn_store())),
            Arc::new(UserRepository::new(f.mem.dyn_store())),
            f.mem.uow.clone(),
        );
        let cmd = RescheduleAppointmentCommand {
            appointment_id: event.appointment_id.clone(),
            start_at: ten_am() + Duration::minutes(30),
            duration_minutes: Some(90),
            staff_id: None,
        };
        let moved = uc.execute(cmd, ctx()).await.unwrap();
        assert_eq!(moved.previous_start_at, ten_am());
        assert_eq!(moved.staff_id.as_deref(), Some(f.staff_id.as_str()));

        let stored = appointments.find_by_id(&event.appointment_id).await.unwrap().unwrap();
        assert_eq!(stored.duration_minutes, 90);
        assert_eq!(stored.end_at, ten_am() + Duration::minutes(120));
    }
}
