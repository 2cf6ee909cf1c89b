//! Sales Order API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{SalesOrder, SalesOrderStatus};
use super::operations::{
    CancelSalesOrderCommand, CompleteSalesOrderCommand, ConfirmSalesOrderCommand, CreateSalesOrderCommand,
    UpdateSalesOrderPricingCommand,
};
use super::queries::{GetSalesOrderQuery, ListSalesOrdersQuery};
use super::repository::SalesOrderFilter;
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderResponse {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub vehicle_id: String,
    pub salesperson_id: String,
    pub status: SalesOrderStatus,
    pub vehicle_price_cents: i64,
    pub discount_cents: i64,
    pub trade_in_cents: i64,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SalesOrder> for SalesOrderResponse {
    fn from(o: SalesOrder) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number,
            customer_id: o.customer_id,
            vehicle_id: o.vehicle_id,
            salesperson_id: o.salesperson_id,
            status: o.status,
            vehicle_price_cents: o.vehicle_price_cents,
            discount_cents: o.discount_cents,
            trade_in_cents: o.trade_in_cents,
            tax_rate_bps: o.tax_rate_bps,
            subtotal_cents: o.subtotal_cents,
            tax_cents: o.tax_cents,
            total_cents: o.total_cents,
            notes: o.notes,
            cancellation_reason: o.cancellation_reason,
            confirmed_at: o.confirmed_at,
            completed_at: o.completed_at,
            cancelled_at: o.cancelled_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SalesOrderListParams {
    pub status: Option<SalesOrderStatus>,
    pub customer_id: Option<String>,
    pub salesperson_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Write up a deal
#[utoipa::path(
    post,
    path = "",
    tag = "sales-orders",
    operation_id = "postApiSalesOrders",
    request_body = CreateSalesOrderCommand,
    responses(
        (status = 201, description = "Order created and vehicle reserved", body = CreatedResponse),
        (status = 404, description = "Customer or vehicle not found"),
        (status = 409, description = "Vehicle not available")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_sales_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<CreateSalesOrderCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::SALES_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.order_id))))
}

/// List sales orders
#[utoipa::path(
    get,
    path = "",
    tag = "sales-orders",
    operation_id = "getApiSalesOrders",
    params(PaginationParams, SalesOrderListParams),
    responses(
        (status = 200, description = "Sales orders", body = PaginatedResponse<SalesOrderResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_sales_orders(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<SalesOrderListParams>,
) -> Result<Json<PaginatedResponse<SalesOrderResponse>>, PlatformError> {
    checks::require(&auth, permissions::SALES_READ)?;
    let query = ListSalesOrdersQuery {
        filter: SalesOrderFilter {
            status: params.status,
            customer_id: params.customer_id,
            salesperson_id: params.salesperson_id,
        },
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get a sales order
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "sales-orders",
    operation_id = "getApiSalesOrdersById",
    params(("id" = String, Path, description = "Sales order ID")),
    responses(
        (status = 200, description = "Sales order", body = SalesOrderResponse),
        (status = 404, description = "Sales order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_sales_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SalesOrderResponse>, PlatformError> {
    checks::require(&auth, permissions::SALES_READ)?;
    let order = state.mediator.query(GetSalesOrderQuery { id }).await?;
    Ok(Json(order.into()))
}

/// Reprice a draft order
#[utoipa::path(
    put,
    path = "/{id}/pricing",
    tag = "sales-orders",
    operation_id = "putApiSalesOrdersByIdPricing",
    params(("id" = String, Path, description = "Sales order ID")),
    request_body = UpdateSalesOrderPricingCommand,
    responses(
        (status = 200, description = "Pricing updated", body = SalesOrderResponse),
        (status = 400, description = "Negative subtotal or invalid tax rate"),
        (status = 409, description = "Order is not a draft")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_pricing(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(mut command): Json<UpdateSalesOrderPricingCommand>,
) -> Result<Json<SalesOrderResponse>, PlatformError> {
    checks::require(&auth, permissions::SALES_WRITE)?;
    command.order_id = id.clone();
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    let order = state.mediator.query(GetSalesOrderQuery { id }).await?;
    Ok(Json(order.into()))
}

/// Confirm a draft order
#[utoipa::path(
    post,
    path = "/{id}/confirm",
    tag = "sales-orders",
    operation_id = "postApiSalesOrdersByIdConfirm",
    params(("id" = String, Path, description = "Sales order ID")),
    responses(
        (status = 204, description = "Order confirmed"),
        (status = 409, description = "Invalid status transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn confirm_sales_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::SALES_WRITE)?;
    state
        .mediator
        .send(ConfirmSalesOrderCommand { order_id: id }, auth.execution_context())
        .await
        .into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Complete a paid order
#[utoipa::path(
    post,
    path = "/{id}/complete",
    tag = "sales-orders",
    operation_id = "postApiSalesOrdersByIdComplete",
    params(("id" = String, Path, description = "Sales order ID")),
    responses(
        (status = 204, description = "Order completed and vehicle sold"),
        (status = 409, description = "Order not confirmed or invoice not paid")
    ),
    security(("bearer_auth" = []))
)]
pub async fn complete_sales_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::SALES_WRITE)?;
    state
        .mediator
        .send(CompleteSalesOrderCommand { order_id: id }, auth.execution_context())
        .await
        .into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel an open order
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = "sales-orders",
    operation_id = "postApiSalesOrdersByIdCancel",
    params(("id" = String, Path, description = "Sales order ID")),
    request_body = CancelRequest,
    responses(
        (status = 204, description = "Order cancelled and vehicle released"),
        (status = 409, description = "Order closed or invoiced")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_sales_order(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<CancelRequest>>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::SALES_WRITE)?;
    let reason = body.and_then(|Json(req)| req.reason);
    state
        .mediator
        .send(CancelSalesOrderCommand { order_id: id, reason }, auth.execution_context())
        .await
        .into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn sales_orders_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_sales_order, list_sales_orders))
        .routes(routes!(get_sales_order))
        .routes(routes!(update_pricing))
        .routes(routes!(confirm_sales_order))
        .routes(routes!(complete_sales_order))
        .routes(routes!(cancel_sales_order))
        .with_state(state)
}
