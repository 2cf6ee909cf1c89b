//! Appointment Operations

pub mod events;
pub mod lifecycle;
pub mod schedule;

pub use events::*;
pub use lifecycle::{
    CancelAppointmentCommand, CancelAppointmentUseCase, CompleteAppointmentCommand, CompleteAppointmentUseCase,
    ConfirmAppointmentCommand, ConfirmAppointmentUseCase, MarkNoShowCommand, MarkNoShowUseCase,
};
pub use schedule::{
    RescheduleAppointmentCommand, RescheduleAppointmentUseCase, ScheduleAppointmentCommand, ScheduleAppointmentUseCase,
};

use chrono::{DateTime, Utc};

use super::entity::{end_of, Appointment, AppointmentKind, AppointmentStatus, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES};
use super::repository::AppointmentRepository;
use crate::details;
use crate::shared::validation::invalid_transition;
use crate::usecase::UseCaseError;
use crate::user::repository::UserRepository;
use crate::vehicle::entity::VehicleStatus;
use crate::vehicle::operations::load_vehicle;
use crate::vehicle::repository::VehicleRepository;

pub(crate) async fn load_appointment(appointments: &AppointmentRepository, id: &str) -> Result<Appointment, UseCaseError> {
    appointments
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("APPOINTMENT_NOT_FOUND", format!("Appointment '{}' not found", id)))
}

pub(crate) fn require_status(
    appt: &Appointment,
    allowed: &[AppointmentStatus],
    to: AppointmentStatus,
) -> Result<(), UseCaseError> {
    if allowed.contains(&appt.status) {
        Ok(())
    } else {
        Err(invalid_transition("Appointment", appt.status.as_str(), to.as_str()))
    }
}

/// A proposed `[start, start + duration)` slot.
pub(crate) struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl Slot {
    pub fn new(start: DateTime<Utc>, duration_minutes: u32, now: DateTime<Utc>) -> Result<Self, UseCaseError> {
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(UseCaseError::validation_with_details(
                "INVALID_DURATION",
                format!(
                    "Duration must be between {} and {} minutes",
                    MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
                ),
                details! { "durationMinutes" => duration_minutes },
            ));
        }
        if start <= now {
            return Err(UseCaseError::validation(
                "START_IN_PAST",
                "Appointments must start in the future",
            ));
        }
        Ok(Self {
            start,
            end: end_of(start, duration_minutes),
            duration_minutes,
        })
    }
}

/// Shared booking checks for schedule and reschedule.
pub(crate) struct Booking<'a> {
    pub appointments: &'a AppointmentRepository,
    pub vehicles: &'a VehicleRepository,
    pub users: &'a UserRepository,
}

impl Booking<'_> {
    pub async fn check_staff(&self, staff_id: Option<&str>) -> Result<(), UseCaseError> {
        let Some(staff_id) = staff_id else {
            return Ok(());
        };
        match self.users.find_by_id(staff_id).await? {
            Some(user) if user.active && user.role.is_staff() => Ok(()),
            _ => Err(UseCaseError::validation(
                "INVALID_STAFF",
                format!("'{}' is not an active staff member", staff_id),
            )),
        }
    }

    pub async fn check_vehicle(&self, kind: AppointmentKind, vehicle_id: Option<&str>) -> Result<(), UseCaseError> {
        let Some(vehicle_id) = vehicle_id else {
            if kind == AppointmentKind::TestDrive {
                return Err(UseCaseError::validation(
                    "VEHICLE_REQUIRED",
                    "A test drive needs a vehicle",
                ));
            }
            return Ok(());
        };
        let vehicle = load_vehicle(self.vehicles, vehicle_id).await?;
        if kind == AppointmentKind::TestDrive && vehicle.status == VehicleStatus::Sold {
            return Err(UseCaseError::business_rule_with_details(
                "VEHICLE_SOLD",
                format!("{} has been sold", vehicle.title()),
                details! { "vehicleId" => vehicle.id },
            ));
        }
        Ok(())
    }

    pub async fn check_conflicts(
        &self,
        staff_id: Option<&str>,
        vehicle_id: Option<&str>,
        slot: &Slot,
        exclude_id: Option<&str>,
    ) -> Result<(), UseCaseError> {
        let conflicts = self
            .appointments
            .find_conflicts(staff_id, vehicle_id, slot.start, slot.end, exclude_id)
            .await?;
        match conflicts.first() {
            None => Ok(()),
            Some(existing) => {
                let clash = if staff_id.is_some() && existing.staff_id.as_deref() == staff_id {
                    "staff"
                } else {
                    "vehicle"
                };
                Err(UseCaseError::business_rule_with_details(
                    "SLOT_UNAVAILABLE",
                    format!("The {} is already booked at that time", clash),
                    details! {
                        "conflictingAppointmentId" => existing.id,
                        "startAt" => existing.start_at.to_rfc3339(),
                        "endAt" => existing.end_at.to_rfc3339(),
                    },
                ))
            }
        }
    }
}
