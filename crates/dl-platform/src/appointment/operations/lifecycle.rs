//! Confirm / Complete / Cancel / No-show Use Cases

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::AppointmentStatusChanged;
use super::{load_appointment, require_status};
use crate::appointment::entity::AppointmentStatus;
use crate::appointment::repository::AppointmentRepository;
use crate::details;
use crate::mediator::Command;
use crate::shared::validation::required;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

/// Moves an appointment to `to` when its status is one of `allowed`.
async fn transition<U: UnitOfWork, C: Serialize + Send + Sync>(
    appointments: &AppointmentRepository,
    unit_of_work: &U,
    appointment_id: &str,
    allowed: &[AppointmentStatus],
    to: AppointmentStatus,
    command: &C,
    ctx: ExecutionContext,
) -> UseCaseResult<AppointmentStatusChanged> {
    let mut appt = try_use_case!(load_appointment(appointments, appointment_id).await);
    try_use_case!(require_status(&appt, allowed, to));

    let previous = appt.status;
    appt.set_status(to);

    let event = AppointmentStatusChanged::new(&ctx, &appt, previous);
    unit_of_work.commit(&appt, event, command).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAppointmentCommand {
    pub appointment_id: String,
}

impl Command for ConfirmAppointmentCommand {
    type Output = AppointmentStatusChanged;
}

pub struct ConfirmAppointmentUseCase<U: UnitOfWork> {
    appointments: Arc<AppointmentRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> ConfirmAppointmentUseCase<U> {
    pub fn new(appointments: Arc<AppointmentRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            appointments,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: ConfirmAppointmentCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<AppointmentStatusChanged> {
        transition(
            &self.appointments,
            self.unit_of_work.as_ref(),
            &command.appointment_id,
            &[AppointmentStatus::Scheduled],
            AppointmentStatus::Confirmed,
            &command,
            ctx,
        )
        .await
    }
}

crate::impl_command_handler!(ConfirmAppointmentUseCase, ConfirmAppointmentCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteAppointmentCommand {
    pub appointment_id: String,
}

impl Command for CompleteAppointmentCommand {
    type Output = AppointmentStatusChanged;
}

pub struct CompleteAppointmentUseCase<U: UnitOfWork> {
    appointments: Arc<AppointmentRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CompleteAppointmentUseCase<U> {
    pub fn new(appointments: Arc<AppointmentRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            appointments,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CompleteAppointmentCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<AppointmentStatusChanged> {
        transition(
            &self.appointments,
            self.unit_of_work.as_ref(),
            &command.appointment_id,
            &AppointmentStatus::ACTIVE,
            AppointmentStatus::Completed,
            &command,
            ctx,
        )
        .await
    }
}

crate::impl_command_handler!(CompleteAppointmentUseCase, CompleteAppointmentCommand);

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentCommand {
    #[serde(default)]
    pub appointment_id: String,
    pub reason: String,
}

impl Command for CancelAppointmentCommand {
    type Output = AppointmentStatusChanged;
}

pub struct CancelAppointmentUseCase<U: UnitOfWork> {
    appointments: Arc<AppointmentRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CancelAppointmentUseCase<U> {
    pub fn new(appointments: Arc<AppointmentRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            appointments,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CancelAppointmentCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<AppointmentStatusChanged> {
        let reason = try_use_case!(required(&command.reason, "REASON_REQUIRED", "Cancellation reason"));
        let mut appt = try_use_case!(load_appointment(&self.appointments, &command.appointment_id).await);
        try_use_case!(require_status(&appt, &AppointmentStatus::ACTIVE, AppointmentStatus::Cancelled));

        let previous = appt.status;
        appt.cancel(reason);

        let event = AppointmentStatusChanged::new(&ctx, &appt, previous);
        self.unit_of_work.commit(&appt, event, &command).await
    }
}

crate::impl_command_handler!(CancelAppointmentUseCase, CancelAppointmentCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkNoShowCommand {
    pub appointment_id: String,
}

impl Command for MarkNoShowCommand {
    type Output = AppointmentStatusChanged;
}

pub struct MarkNoShowUseCase<U: UnitOfWork> {
    appointments: Arc<AppointmentRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> MarkNoShowUseCase<U> {
    pub fn new(appointments: Arc<AppointmentRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            appointments,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: MarkNoShowCommand, ctx: ExecutionContext) -> UseCaseResult<AppointmentStatusChanged> {
        let mut appt = try_use_case!(load_appointment(&self.appointments, &command.appointment_id).await);
        try_use_case!(require_status(&appt, &AppointmentStatus::ACTIVE, AppointmentStatus::NoShow));
        if Utc::now() < appt.start_at {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "APPOINTMENT_NOT_STARTED",
                "A no-show can only be recorded after the start time",
                details! { "startAt" => appt.start_at.to_rfc3339() },
            ));
        }

        let previous = appt.status;
        appt.set_status(AppointmentStatus::NoShow);

        let event = AppointmentStatusChanged::new(&ctx, &appt, previous);
        self.unit_of_work.commit(&appt, event, &command).await
    }
}

crate::impl_command_handler!(MarkNoShowUseCase, MarkNoShowCommand);
