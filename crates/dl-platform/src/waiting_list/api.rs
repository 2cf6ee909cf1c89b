//! Waiting List API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{WaitingListEntry, WaitingListStatus};
use super::operations::{
    FulfillWaitingListEntryCommand, JoinWaitingListCommand, LeaveWaitingListCommand, NotifyWaitingListCommand,
};
use super::queries::{GetWaitingListEntryQuery, ListWaitingListQuery};
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;
use crate::vehicle::entity::VehicleCondition;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListEntryResponse {
    pub id: String,
    pub customer_id: String,
    pub make: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<VehicleCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: WaitingListStatus,
    pub notified_vehicle_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilled_by_vehicle_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<WaitingListEntry> for WaitingListEntryResponse {
    fn from(e: WaitingListEntry) -> Self {
        Self {
            id: e.id,
            customer_id: e.customer_id,
            make: e.make,
            model: e.model,
            min_year: e.min_year,
            max_year: e.max_year,
            max_price_cents: e.max_price_cents,
            condition: e.condition,
            notes: e.notes,
            status: e.status,
            notified_vehicle_ids: e.notified_vehicle_ids,
            notified_at: e.notified_at,
            fulfilled_by_vehicle_id: e.fulfilled_by_vehicle_id,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WaitingListParams {
    pub status: Option<WaitingListStatus>,
    pub customer_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub vehicle_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyResponse {
    pub vehicle_id: String,
    pub entry_ids: Vec<String>,
    pub customer_ids: Vec<String>,
}

/// Put a customer on the waiting list
#[utoipa::path(
    post,
    path = "",
    tag = "waiting-list",
    operation_id = "postApiWaitingList",
    request_body = JoinWaitingListCommand,
    responses(
        (status = 201, description = "Entry created", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer already waiting for this vehicle")
    ),
    security(("bearer_auth" = []))
)]
pub async fn join_waiting_list(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<JoinWaitingListCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::WAITLIST_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.entry_id))))
}

/// List waiting-list entries, oldest first
#[utoipa::path(
    get,
    path = "",
    tag = "waiting-list",
    operation_id = "getApiWaitingList",
    params(PaginationParams, WaitingListParams),
    responses(
        (status = 200, description = "Entries", body = PaginatedResponse<WaitingListEntryResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_waiting_list(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<WaitingListParams>,
) -> Result<Json<PaginatedResponse<WaitingListEntryResponse>>, PlatformError> {
    checks::require(&auth, permissions::WAITLIST_READ)?;
    let query = ListWaitingListQuery {
        status: params.status,
        customer_id: params.customer_id,
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get a waiting-list entry
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "waiting-list",
    operation_id = "getApiWaitingListById",
    params(("id" = String, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry", body = WaitingListEntryResponse),
        (status = 404, description = "Entry not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_waiting_list_entry(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<WaitingListEntryResponse>, PlatformError> {
    checks::require(&auth, permissions::WAITLIST_READ)?;
    let entry = state.mediator.query(GetWaitingListEntryQuery { id }).await?;
    Ok(Json(entry.into()))
}

/// Take a customer off the waiting list
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "waiting-list",
    operation_id = "deleteApiWaitingListById",
    params(("id" = String, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry cancelled"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Entry already closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn leave_waiting_list(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::WAITLIST_WRITE)?;
    let command = LeaveWaitingListCommand { entry_id: id };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark an entry fulfilled
#[utoipa::path(
    post,
    path = "/{id}/fulfill",
    tag = "waiting-list",
    operation_id = "postApiWaitingListByIdFulfill",
    params(("id" = String, Path, description = "Entry ID")),
    request_body = FulfillWaitingListEntryCommand,
    responses(
        (status = 204, description = "Entry fulfilled"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Entry already closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn fulfill_waiting_list_entry(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<FulfillWaitingListEntryCommand>>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::WAITLIST_WRITE)?;
    let mut command = body.map(|Json(c)| c).unwrap_or_default();
    command.entry_id = id;
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Notify everyone waiting for a vehicle that is now on the lot
#[utoipa::path(
    post,
    path = "/notify",
    tag = "waiting-list",
    operation_id = "postApiWaitingListNotify",
    request_body = NotifyRequest,
    responses(
        (status = 200, description = "Entries notified", body = NotifyResponse),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle not available or nobody waiting")
    ),
    security(("bearer_auth" = []))
)]
pub async fn notify_waiting_list(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(req): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>, PlatformError> {
    checks::require(&auth, permissions::WAITLIST_WRITE)?;
    let command = NotifyWaitingListCommand {
        vehicle_id: req.vehicle_id,
    };
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(Json(NotifyResponse {
        vehicle_id: event.vehicle_id,
        entry_ids: event.entry_ids,
        customer_ids: event.customer_ids,
    }))
}

pub fn waiting_list_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(join_waiting_list, list_waiting_list))
        .routes(routes!(notify_waiting_list))
        .routes(routes!(get_waiting_list_entry, leave_waiting_list))
        .routes(routes!(fulfill_waiting_list_entry))
        .with_state(state)
}
