//! Service Order API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{ServiceOrder, ServiceOrderStatus, ServiceTask};
use super::operations::{
    AddServiceTaskCommand, AssignTechnicianCommand, CancelServiceOrderCommand, CompleteServiceOrderCommand,
    OpenServiceOrderCommand, RemoveServiceTaskCommand, StartServiceOrderCommand,
};
use super::queries::{GetServiceOrderQuery, ListServiceOrdersQuery};
use super::repository::ServiceOrderFilter;
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTaskResponse {
    pub id: String,
    pub description: String,
    /// Decimal hours, e.g. "1.5"
    pub labor_hours: String,
    pub labor_rate_cents: i64,
    pub labor_cents: i64,
    pub parts_cost_cents: i64,
}

impl From<ServiceTask> for ServiceTaskResponse {
    fn from(t: ServiceTask) -> Self {
        Self {
            labor_hours: t.hours(),
            labor_cents: t.labor_cents(),
            id: t.id,
            description: t.description,
            labor_rate_cents: t.labor_rate_cents,
            parts_cost_cents: t.parts_cost_cents,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderResponse {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub vin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    pub complaint: String,
    pub tasks: Vec<ServiceTaskResponse>,
    pub labor_total_cents: i64,
    pub parts_total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<String>,
    pub status: ServiceOrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceOrder> for ServiceOrderResponse {
    fn from(o: ServiceOrder) -> Self {
        Self {
            labor_total_cents: o.labor_total_cents(),
            parts_total_cents: o.parts_total_cents(),
            id: o.id,
            order_number: o.order_number,
            customer_id: o.customer_id,
            vin: o.vin,
            vehicle_id: o.vehicle_id,
            complaint: o.complaint,
            tasks: o.tasks.into_iter().map(Into::into).collect(),
            technician_id: o.technician_id,
            status: o.status,
            cancellation_reason: o.cancellation_reason,
            started_at: o.started_at,
            completed_at: o.completed_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ServiceOrderListParams {
    pub status: Option<ServiceOrderStatus>,
    pub customer_id: Option<String>,
    pub technician_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTechnicianRequest {
    pub technician_id: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelServiceOrderRequest {
    pub reason: Option<String>,
}

/// Open a repair order
#[utoipa::path(
    post,
    path = "",
    tag = "service-orders",
    operation_id = "postApiServiceOrders",
    request_body = OpenServiceOrderCommand,
    responses(
        (status = 201, description = "Service order opened", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Customer or vehicle not found"),
        (status = 409, description = "Vehicle not available for service")
    ),
    security(("bearer_auth" = []))
)]
pub async fn open_service_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<OpenServiceOrderCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::SERVICE_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.order_id))))
}

/// List service orders
#[utoipa::path(
    get,
    path = "",
    tag = "service-orders",
    operation_id = "getApiServiceOrders",
    params(PaginationParams, ServiceOrderListParams),
    responses(
        (status = 200, description = "Service orders", body = PaginatedResponse<ServiceOrderResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_service_orders(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<ServiceOrderListParams>,
) -> Result<Json<PaginatedResponse<ServiceOrderResponse>>, PlatformError> {
    checks::require(&auth, permissions::SERVICE_READ)?;
    let query = ListServiceOrdersQuery {
        filter: ServiceOrderFilter {
            status: params.status,
            customer_id: params.customer_id,
            technician_id: params.technician_id,
        },
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get a service order
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "service-orders",
    operation_id = "getApiServiceOrdersById",
    params(("id" = String, Path, description = "Service order ID")),
    responses(
        (status = 200, description = "Service order", body = ServiceOrderResponse),
        (status = 404, description = "Service order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_service_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ServiceOrderResponse>, PlatformError> {
    checks::require(&auth, permissions::SERVICE_READ)?;
    let order = state.mediator.query(GetServiceOrderQuery { id }).await?;
    Ok(Json(order.into()))
}

/// Add a labor/parts task
#[utoipa::path(
    post,
    path = "/{id}/tasks",
    tag = "service-orders",
    operation_id = "postApiServiceOrdersByIdTasks",
    params(("id" = String, Path, description = "Service order ID")),
    request_body = AddServiceTaskCommand,
    responses(
        (status = 201, description = "Task added", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Service order closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_task(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(mut command): Json<AddServiceTaskCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::SERVICE_WRITE)?;
    command.service_order_id = id;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.task_id))))
}

/// Remove a task
#[utoipa::path(
    delete,
    path = "/{id}/tasks/{task_id}",
    tag = "service-orders",
    operation_id = "deleteApiServiceOrdersByIdTasksByTaskId",
    params(
        ("id" = String, Path, description = "Service order ID"),
        ("task_id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task removed"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Service order closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_task(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path((id, task_id)): Path<(String, String)>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::SERVICE_WRITE)?;
    let command = RemoveServiceTaskCommand {
        service_order_id: id,
        task_id,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign the technician
#[utoipa::path(
    put,
    path = "/{id}/technician",
    tag = "service-orders",
    operation_id = "putApiServiceOrdersByIdTechnician",
    params(("id" = String, Path, description = "Service order ID")),
    request_body = AssignTechnicianRequest,
    responses(
        (status = 204, description = "Technician assigned"),
        (status = 400, description = "Not an active staff member"),
        (status = 409, description = "Service order closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_technician(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<AssignTechnicianRequest>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::SERVICE_WRITE)?;
    let command = AssignTechnicianCommand {
        service_order_id: id,
        technician_id: req.technician_id,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start work
#[utoipa::path(
    post,
    path = "/{id}/start",
    tag = "service-orders",
    operation_id = "postApiServiceOrdersByIdStart",
    params(("id" = String, Path, description = "Service order ID")),
    responses(
        (status = 204, description = "Work started"),
        (status = 409, description = "No technician, no tasks or not open")
    ),
    security(("bearer_auth" = []))
)]
pub async fn start_service_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::SERVICE_WRITE)?;
    let command = StartServiceOrderCommand { service_order_id: id };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Finish work
#[utoipa::path(
    post,
    path = "/{id}/complete",
    tag = "service-orders",
    operation_id = "postApiServiceOrdersByIdComplete",
    params(("id" = String, Path, description = "Service order ID")),
    responses(
        (status = 204, description = "Service order completed"),
        (status = 409, description = "Service order not in progress")
    ),
    security(("bearer_auth" = []))
)]
pub async fn complete_service_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::SERVICE_WRITE)?;
    let command = CompleteServiceOrderCommand { service_order_id: id };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel an open or in-progress order
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = "service-orders",
    operation_id = "postApiServiceOrdersByIdCancel",
    params(("id" = String, Path, description = "Service order ID")),
    request_body = CancelServiceOrderRequest,
    responses(
        (status = 204, description = "Service order cancelled"),
        (status = 409, description = "Service order already closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_service_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<CancelServiceOrderRequest>>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::SERVICE_WRITE)?;
    let reason = body.and_then(|Json(req)| req.reason);
    let command = CancelServiceOrderCommand {
        service_order_id: id,
        reason,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn service_orders_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(open_service_order, list_service_orders))
        .routes(routes!(get_service_order))
        .routes(routes!(add_task))
        .routes(routes!(remove_task))
        .routes(routes!(assign_technician))
        .routes(routes!(start_service_order))
        .routes(routes!(complete_service_order))
        .routes(routes!(cancel_service_order))
        .with_state(state)
}
