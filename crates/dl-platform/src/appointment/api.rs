//! Appointment API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{Appointment, AppointmentKind, AppointmentStatus};
use super::operations::{
    CancelAppointmentCommand, CompleteAppointmentCommand, ConfirmAppointmentCommand, MarkNoShowCommand,
    RescheduleAppointmentCommand, ScheduleAppointmentCommand,
};
use super::queries::{GetAppointmentQuery, ListAppointmentsQuery};
use super::repository::AppointmentFilter;
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: String,
    pub customer_id: String,
    pub kind: AppointmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            customer_id: a.customer_id,
            kind: a.kind,
            staff_id: a.staff_id,
            vehicle_id: a.vehicle_id,
            start_at: a.start_at,
            end_at: a.end_at,
            duration_minutes: a.duration_minutes,
            notes: a.notes,
            status: a.status,
            cancellation_reason: a.cancellation_reason,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AppointmentListParams {
    pub customer_id: Option<String>,
    pub staff_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    /// Starting at or after (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Starting before (RFC 3339)
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelAppointmentRequest {
    pub reason: String,
}

/// Schedule an appointment
#[utoipa::path(
    post,
    path = "",
    tag = "appointments",
    operation_id = "postApiAppointments",
    request_body = ScheduleAppointmentCommand,
    responses(
        (status = 201, description = "Appointment scheduled", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Slot unavailable or vehicle sold")
    ),
    security(("bearer_auth" = []))
)]
pub async fn schedule_appointment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<ScheduleAppointmentCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::APPOINTMENTS_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.appointment_id))))
}

/// List appointments, soonest first
#[utoipa::path(
    get,
    path = "",
    tag = "appointments",
    operation_id = "getApiAppointments",
    params(PaginationParams, AppointmentListParams),
    responses(
        (status = 200, description = "Appointments", body = PaginatedResponse<AppointmentResponse>),
        (status = 400, description = "Invalid date range")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_appointments(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<AppointmentListParams>,
) -> Result<Json<PaginatedResponse<AppointmentResponse>>, PlatformError> {
    checks::require(&auth, permissions::APPOINTMENTS_READ)?;
    let query = ListAppointmentsQuery {
        filter: AppointmentFilter {
            customer_id: params.customer_id,
            staff_id: params.staff_id,
            vehicle_id: params.vehicle_id,
            status: params.status,
            from: params.from,
            to: params.to,
        },
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get an appointment
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "appointments",
    operation_id = "getApiAppointmentsById",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment", body = AppointmentResponse),
        (status = 404, description = "Appointment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_appointment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, PlatformError> {
    checks::require(&auth, permissions::APPOINTMENTS_READ)?;
    let appointment = state.mediator.query(GetAppointmentQuery { id }).await?;
    Ok(Json(appointment.into()))
}

/// Move an appointment to a new slot
#[utoipa::path(
    put,
    path = "/{id}/slot",
    tag = "appointments",
    operation_id = "putApiAppointmentsByIdSlot",
    params(("id" = String, Path, description = "Appointment ID")),
    request_body = RescheduleAppointmentCommand,
    responses(
        (status = 204, description = "Appointment rescheduled"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Slot unavailable or appointment closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reschedule_appointment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(mut command): Json<RescheduleAppointmentCommand>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::APPOINTMENTS_WRITE)?;
    command.appointment_id = id;
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Confirm a scheduled appointment
#[utoipa::path(
    post,
    path = "/{id}/confirm",
    tag = "appointments",
    operation_id = "postApiAppointmentsByIdConfirm",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 204, description = "Appointment confirmed"),
        (status = 409, description = "Appointment not scheduled")
    ),
    security(("bearer_auth" = []))
)]
pub async fn confirm_appointment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::APPOINTMENTS_WRITE)?;
    let command = ConfirmAppointmentCommand { appointment_id: id };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark an appointment as held
#[utoipa::path(
    post,
    path = "/{id}/complete",
    tag = "appointments",
    operation_id = "postApiAppointmentsByIdComplete",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 204, description = "Appointment completed"),
        (status = 409, description = "Appointment closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn complete_appointment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::APPOINTMENTS_WRITE)?;
    let command = CompleteAppointmentCommand { appointment_id: id };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel an appointment
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = "appointments",
    operation_id = "postApiAppointmentsByIdCancel",
    params(("id" = String, Path, description = "Appointment ID")),
    request_body = CancelAppointmentRequest,
    responses(
        (status = 204, description = "Appointment cancelled"),
        (status = 400, description = "Reason missing"),
        (status = 409, description = "Appointment closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_appointment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<CancelAppointmentRequest>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::APPOINTMENTS_WRITE)?;
    let command = CancelAppointmentCommand {
        appointment_id: id,
        reason: req.reason,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record that the customer did not turn up
#[utoipa::path(
    post,
    path = "/{id}/no-show",
    tag = "appointments",
    operation_id = "postApiAppointmentsByIdNoShow",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 204, description = "Appointment marked no-show"),
        (status = 409, description = "Appointment not started yet or closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_no_show(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::APPOINTMENTS_WRITE)?;
    let command = MarkNoShowCommand { appointment_id: id };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn appointments_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(schedule_appointment, list_appointments))
        .routes(routes!(get_appointment))
        .routes(routes!(reschedule_appointment))
        .routes(routes!(confirm_appointment))
        .routes(routes!(complete_appointment))
        .routes(routes!(cancel_appointment))
        .routes(routes!(mark_no_show))
        .with_state(state)
}
