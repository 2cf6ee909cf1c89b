//! Invoice API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{Invoice, InvoiceLine, InvoiceSource, InvoiceStatus};
use super::operations::{IssueSalesInvoiceCommand, IssueServiceInvoiceCommand, VoidInvoiceCommand};
use super::queries::{GetInvoiceQuery, ListInvoicesQuery};
use super::repository::InvoiceFilter;
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub customer_id: String,
    pub source_type: InvoiceSource,
    pub source_id: String,
    pub lines: Vec<InvoiceLine>,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub amount_paid_cents: i64,
    pub balance_cents: i64,
    pub status: InvoiceStatus,
    pub overdue: bool,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voided_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub void_reason: Option<String>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(i: Invoice) -> Self {
        Self {
            balance_cents: i.balance_cents(),
            overdue: i.is_overdue(Utc::now()),
            id: i.id,
            invoice_number: i.invoice_number,
            customer_id: i.customer_id,
            source_type: i.source_type,
            source_id: i.source_id,
            lines: i.lines,
            tax_rate_bps: i.tax_rate_bps,
            subtotal_cents: i.subtotal_cents,
            tax_cents: i.tax_cents,
            total_cents: i.total_cents,
            amount_paid_cents: i.amount_paid_cents,
            status: i.status,
            issued_at: i.issued_at,
            due_at: i.due_at,
            paid_at: i.paid_at,
            voided_at: i.voided_at,
            void_reason: i.void_reason,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InvoiceListParams {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<String>,
    /// Only issued or partially paid invoices
    #[serde(default)]
    pub outstanding: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VoidRequest {
    pub reason: String,
}

/// Invoice a confirmed sales order
#[utoipa::path(
    post,
    path = "/sales",
    tag = "invoices",
    operation_id = "postApiInvoicesSales",
    request_body = IssueSalesInvoiceCommand,
    responses(
        (status = 201, description = "Invoice issued", body = CreatedResponse),
        (status = 409, description = "Order not confirmed or already invoiced")
    ),
    security(("bearer_auth" = []))
)]
pub async fn issue_sales_invoice(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<IssueSalesInvoiceCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::INVOICES_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.invoice_id))))
}

/// Invoice a completed service order
#[utoipa::path(
    post,
    path = "/service",
    tag = "invoices",
    operation_id = "postApiInvoicesService",
    request_body = IssueServiceInvoiceCommand,
    responses(
        (status = 201, description = "Invoice issued", body = CreatedResponse),
        (status = 409, description = "Service order not completed or already invoiced")
    ),
    security(("bearer_auth" = []))
)]
pub async fn issue_service_invoice(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<IssueServiceInvoiceCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::INVOICES_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.invoice_id))))
}

/// List invoices
#[utoipa::path(
    get,
    path = "",
    tag = "invoices",
    operation_id = "getApiInvoices",
    params(PaginationParams, InvoiceListParams),
    responses(
        (status = 200, description = "Invoices", body = PaginatedResponse<InvoiceResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_invoices(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<InvoiceListParams>,
) -> Result<Json<PaginatedResponse<InvoiceResponse>>, PlatformError> {
    checks::require(&auth, permissions::INVOICES_READ)?;
    let query = ListInvoicesQuery {
        filter: InvoiceFilter {
            status: params.status,
            customer_id: params.customer_id,
            outstanding: params.outstanding,
        },
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get an invoice
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "invoices",
    operation_id = "getApiInvoicesById",
    params(("id" = String, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = InvoiceResponse),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_invoice(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, PlatformError> {
    checks::require(&auth, permissions::INVOICES_READ)?;
    let invoice = state.mediator.query(GetInvoiceQuery { id }).await?;
    Ok(Json(invoice.into()))
}

/// Void an unpaid invoice
#[utoipa::path(
    post,
    path = "/{id}/void",
    tag = "invoices",
    operation_id = "postApiInvoicesByIdVoid",
    params(("id" = String, Path, description = "Invoice ID")),
    request_body = VoidRequest,
    responses(
        (status = 204, description = "Invoice voided"),
        (status = 400, description = "Reason missing"),
        (status = 409, description = "Invoice has payments or is already void")
    ),
    security(("bearer_auth" = []))
)]
pub async fn void_invoice(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<VoidRequest>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::INVOICES_WRITE)?;
    let command = VoidInvoiceCommand {
        invoice_id: id,
        reason: req.reason,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn invoices_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_invoices))
        .routes(routes!(issue_sales_invoice))
        .routes(routes!(issue_service_invoice))
        .routes(routes!(get_invoice))
        .routes(routes!(void_invoice))
        .with_state(state)
}
