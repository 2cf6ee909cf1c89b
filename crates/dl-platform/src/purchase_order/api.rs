//! Purchase Order API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
use super::operations::{
    CancelPurchaseOrderCommand, CreatePurchaseOrderCommand, PurchaseOrderStatusChanged, ReceivePurchaseOrderCommand,
    SubmitPurchaseOrderCommand, UpdatePurchaseOrderCommand,
};
use super::queries::{GetPurchaseOrderQuery, ListPurchaseOrdersQuery};
use crate::mediator::Mediator;
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::usecase::ExecutionContext;
use crate::user::permissions;
use crate::waiting_list::operations::NotifyWaitingListCommand;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderResponse {
    pub id: String,
    pub order_number: String,
    pub supplier: String,
    pub lines: Vec<PurchaseOrderLine>,
    pub total_cost_cents: i64,
    pub status: PurchaseOrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PurchaseOrder> for PurchaseOrderResponse {
    fn from(o: PurchaseOrder) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number,
            supplier: o.supplier,
            lines: o.lines,
            total_cost_cents: o.total_cost_cents,
            status: o.status,
            notes: o.notes,
            created_by: o.created_by,
            cancellation_reason: o.cancellation_reason,
            submitted_at: o.submitted_at,
            received_at: o.received_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderListParams {
    pub status: Option<PurchaseOrderStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelPurchaseOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub vehicle_ids: Vec<String>,
    /// Waiting-list entries told about the new stock
    pub notified_entries: usize,
}

/// Tell waiting customers about freshly stocked vehicles. Each notification
/// runs under a context caused by the receipt event.
async fn notify_waiting_lists(mediator: &Mediator, receipt: &PurchaseOrderStatusChanged, principal_id: &str) -> usize {
    let mut notified = 0;
    for vehicle_id in &receipt.vehicle_ids {
        let ctx = ExecutionContext::from_parent_event(receipt, principal_id);
        let command = NotifyWaitingListCommand {
            vehicle_id: vehicle_id.clone(),
        };
        match mediator.send(command, ctx).await.into_result() {
            Ok(event) => notified += event.entry_ids.len(),
            Err(e) if e.code() == "NO_MATCHES" => debug!(vehicle_id = %vehicle_id, "No waiting-list matches"),
            Err(e) => warn!(vehicle_id = %vehicle_id, error = %e, "Waiting-list notification failed"),
        }
    }
    notified
}

/// Draft a purchase order
#[utoipa::path(
    post,
    path = "",
    tag = "purchase-orders",
    operation_id = "postApiPurchaseOrders",
    request_body = CreatePurchaseOrderCommand,
    responses(
        (status = 201, description = "Purchase order created", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "VIN already stocked or on order")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_purchase_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<CreatePurchaseOrderCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::PURCHASING_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.order_id))))
}

/// List purchase orders
#[utoipa::path(
    get,
    path = "",
    tag = "purchase-orders",
    operation_id = "getApiPurchaseOrders",
    params(PaginationParams, PurchaseOrderListParams),
    responses(
        (status = 200, description = "Purchase orders", body = PaginatedResponse<PurchaseOrderResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_purchase_orders(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<PurchaseOrderListParams>,
) -> Result<Json<PaginatedResponse<PurchaseOrderResponse>>, PlatformError> {
    checks::require(&auth, permissions::PURCHASING_READ)?;
    let query = ListPurchaseOrdersQuery {
        status: params.status,
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get a purchase order
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "purchase-orders",
    operation_id = "getApiPurchaseOrdersById",
    params(("id" = String, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order", body = PurchaseOrderResponse),
        (status = 404, description = "Purchase order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_purchase_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<PurchaseOrderResponse>, PlatformError> {
    checks::require(&auth, permissions::PURCHASING_READ)?;
    let order = state.mediator.query(GetPurchaseOrderQuery { id }).await?;
    Ok(Json(order.into()))
}

/// Edit a draft purchase order
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "purchase-orders",
    operation_id = "putApiPurchaseOrdersById",
    params(("id" = String, Path, description = "Purchase order ID")),
    request_body = UpdatePurchaseOrderCommand,
    responses(
        (status = 200, description = "Purchase order updated", body = PurchaseOrderResponse),
        (status = 409, description = "Order is not a draft")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_purchase_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(mut command): Json<UpdatePurchaseOrderCommand>,
) -> Result<Json<PurchaseOrderResponse>, PlatformError> {
    checks::require(&auth, permissions::PURCHASING_WRITE)?;
    command.order_id = id.clone();
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    let order = state.mediator.query(GetPurchaseOrderQuery { id }).await?;
    Ok(Json(order.into()))
}

/// Send a draft to the supplier
#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "purchase-orders",
    operation_id = "postApiPurchaseOrdersByIdSubmit",
    params(("id" = String, Path, description = "Purchase order ID")),
    responses(
        (status = 204, description = "Purchase order submitted"),
        (status = 409, description = "Order is not a draft")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_purchase_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::PURCHASING_WRITE)?;
    let command = SubmitPurchaseOrderCommand { order_id: id };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Book a delivery into inventory
#[utoipa::path(
    post,
    path = "/{id}/receive",
    tag = "purchase-orders",
    operation_id = "postApiPurchaseOrdersByIdReceive",
    params(("id" = String, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Vehicles stocked", body = ReceiptResponse),
        (status = 409, description = "Order not submitted or VIN already stocked")
    ),
    security(("bearer_auth" = []))
)]
pub async fn receive_purchase_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ReceiptResponse>, PlatformError> {
    checks::require(&auth, permissions::PURCHASING_WRITE)?;
    let command = ReceivePurchaseOrderCommand { order_id: id };
    let receipt = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    let notified_entries = notify_waiting_lists(&state.mediator, &receipt, &auth.context.principal_id).await;
    Ok(Json(ReceiptResponse {
        vehicle_ids: receipt.vehicle_ids,
        notified_entries,
    }))
}

/// Cancel a draft or submitted order
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = "purchase-orders",
    operation_id = "postApiPurchaseOrdersByIdCancel",
    params(("id" = String, Path, description = "Purchase order ID")),
    request_body = CancelPurchaseOrderRequest,
    responses(
        (status = 204, description = "Purchase order cancelled"),
        (status = 409, description = "Order already received or cancelled")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_purchase_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<CancelPurchaseOrderRequest>>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::PURCHASING_WRITE)?;
    let reason = body.and_then(|Json(req)| req.reason);
    let command = CancelPurchaseOrderCommand { order_id: id, reason };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn purchase_orders_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_purchase_order, list_purchase_orders))
        .routes(routes!(get_purchase_order, update_purchase_order))
        .routes(routes!(submit_purchase_order))
        .routes(routes!(receive_purchase_order))
        .routes(routes!(cancel_purchase_order))
        .with_state(state)
}
