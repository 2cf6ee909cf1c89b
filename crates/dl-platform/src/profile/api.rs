//! Profile API (`/api/me`)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::appointment::api::AppointmentResponse;
use crate::appointment::operations::{CancelAppointmentCommand, ScheduleAppointmentCommand};
use crate::appointment::queries::{GetAppointmentQuery, ListAppointmentsQuery};
use crate::appointment::{AppointmentFilter, AppointmentKind};
use crate::customer::api::CustomerResponse;
use crate::customer::queries::GetCustomerQuery;
use crate::invoice::api::InvoiceResponse;
use crate::invoice::queries::{GetInvoiceQuery, ListInvoicesQuery};
use crate::invoice::InvoiceFilter;
use crate::payment::operations::RecordPaymentCommand;
use crate::payment::PaymentMethod;
use crate::sales_order::api::SalesOrderResponse;
use crate::sales_order::queries::ListSalesOrdersQuery;
use crate::sales_order::SalesOrderFilter;
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;

pub const CUSTOMER_CANCEL_REASON: &str = "Cancelled by customer";

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayInvoiceRequest {
    /// Defaults to the outstanding balance
    pub amount_cents: Option<i64>,
    /// Card processor reference
    pub reference: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub amount_cents: i64,
    pub invoice_balance_cents: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    /// `TEST_DRIVE` or `CONSULTATION`
    pub kind: AppointmentKind,
    pub vehicle_id: Option<String>,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelOwnAppointmentRequest {
    pub reason: Option<String>,
}

/// The caller's customer profile
#[utoipa::path(
    get,
    path = "",
    tag = "me",
    operation_id = "getApiMe",
    responses(
        (status = 200, description = "Customer profile", body = CustomerResponse),
        (status = 403, description = "No customer linked to this account")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<MediatorState>,
    auth: Authenticated,
) -> Result<Json<CustomerResponse>, PlatformError> {
    let customer_id = checks::require_customer(&auth)?.to_string();
    let customer = state.mediator.query(GetCustomerQuery { id: customer_id }).await?;
    Ok(Json(customer.into()))
}

/// The caller's sales orders
#[utoipa::path(
    get,
    path = "/sales-orders",
    tag = "me",
    operation_id = "getApiMeSalesOrders",
    params(PaginationParams),
    responses(
        (status = 200, description = "Own sales orders", body = PaginatedResponse<SalesOrderResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_own_sales_orders(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<SalesOrderResponse>>, PlatformError> {
    let customer_id = checks::require_customer(&auth)?.to_string();
    let query = ListSalesOrdersQuery {
        filter: SalesOrderFilter {
            customer_id: Some(customer_id),
            ..Default::default()
        },
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// The caller's invoices
#[utoipa::path(
    get,
    path = "/invoices",
    tag = "me",
    operation_id = "getApiMeInvoices",
    params(PaginationParams),
    responses(
        (status = 200, description = "Own invoices", body = PaginatedResponse<InvoiceResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_own_invoices(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<InvoiceResponse>>, PlatformError> {
    let customer_id = checks::require_customer(&auth)?.to_string();
    let query = ListInvoicesQuery {
        filter: InvoiceFilter {
            customer_id: Some(customer_id),
            ..Default::default()
        },
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Pay one of the caller's invoices by card
#[utoipa::path(
    post,
    path = "/invoices/{id}/pay",
    tag = "me",
    operation_id = "postApiMeInvoicesByIdPay",
    params(("id" = String, Path, description = "Invoice ID")),
    request_body = PayInvoiceRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentReceipt),
        (status = 403, description = "Invoice belongs to another customer"),
        (status = 409, description = "Invoice not payable or amount exceeds balance")
    ),
    security(("bearer_auth" = []))
)]
pub async fn pay_own_invoice(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<PayInvoiceRequest>>,
) -> Result<(StatusCode, Json<PaymentReceipt>), PlatformError> {
    let invoice = state.mediator.query(GetInvoiceQuery { id }).await?;
    checks::require_owner(&auth, &invoice.customer_id)?;

    let req = body.map(|Json(r)| r).unwrap_or_default();
    let command = RecordPaymentCommand {
        amount_cents: req.amount_cents.unwrap_or_else(|| invoice.balance_cents()),
        invoice_id: invoice.id,
        method: PaymentMethod::Card,
        reference: req.reference,
    };
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentReceipt {
            payment_id: event.payment_id,
            amount_cents: event.amount_cents,
            invoice_balance_cents: event.invoice_balance_cents,
        }),
    ))
}

/// The caller's appointments, soonest first
#[utoipa::path(
    get,
    path = "/appointments",
    tag = "me",
    operation_id = "getApiMeAppointments",
    params(PaginationParams),
    responses(
        (status = 200, description = "Own appointments", body = PaginatedResponse<AppointmentResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_own_appointments(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<AppointmentResponse>>, PlatformError> {
    let customer_id = checks::require_customer(&auth)?.to_string();
    let query = ListAppointmentsQuery {
        filter: AppointmentFilter {
            customer_id: Some(customer_id),
            ..Default::default()
        },
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Book a test drive or consultation
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "me",
    operation_id = "postApiMeAppointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Kind not bookable by customers"),
        (status = 409, description = "Slot unavailable or vehicle sold")
    ),
    security(("bearer_auth" = []))
)]
pub async fn book_appointment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(req): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    let customer_id = checks::require_customer(&auth)?.to_string();
    if !req.kind.is_self_service() {
        return Err(PlatformError::forbidden(format!(
            "{} appointments are booked by staff",
            req.kind.as_str()
        )));
    }
    let command = ScheduleAppointmentCommand {
        customer_id,
        kind: req.kind,
        staff_id: None,
        vehicle_id: req.vehicle_id,
        start_at: req.start_at,
        duration_minutes: req.duration_minutes,
        notes: req.notes,
    };
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.appointment_id))))
}

/// Cancel one of the caller's appointments
#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    tag = "me",
    operation_id = "postApiMeAppointmentsByIdCancel",
    params(("id" = String, Path, description = "Appointment ID")),
    request_body = CancelOwnAppointmentRequest,
    responses(
        (status = 204, description = "Appointment cancelled"),
        (status = 403, description = "Appointment belongs to another customer"),
        (status = 409, description = "Appointment closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_own_appointment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<CancelOwnAppointmentRequest>>,
) -> Result<StatusCode, PlatformError> {
    let appointment = state.mediator.query(GetAppointmentQuery { id }).await?;
    checks::require_owner(&auth, &appointment.customer_id)?;

    let reason = body
        .and_then(|Json(r)| r.reason)
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| CUSTOMER_CANCEL_REASON.to_string());
    let command = CancelAppointmentCommand {
        appointment_id: appointment.id,
        reason,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn profile_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_profile))
        .routes(routes!(list_own_sales_orders))
        .routes(routes!(list_own_invoices))
        .routes(routes!(pay_own_invoice))
        .routes(routes!(list_own_appointments, book_appointment))
        .routes(routes!(cancel_own_appointment))
        .with_state(state)
}
