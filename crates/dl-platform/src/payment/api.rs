//! Payment API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{Payment, PaymentMethod, PaymentStatus};
use super::operations::{RecordPaymentCommand, RefundPaymentCommand};
use super::queries::{GetPaymentQuery, ListPaymentsQuery};
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub payment_number: String,
    pub invoice_id: String,
    pub customer_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub received_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            payment_number: p.payment_number,
            invoice_id: p.invoice_id,
            customer_id: p.customer_id,
            amount_cents: p.amount_cents,
            method: p.method,
            status: p.status,
            reference: p.reference,
            received_by: p.received_by,
            refund_reason: p.refund_reason,
            refunded_at: p.refunded_at,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaymentListParams {
    pub invoice_id: Option<String>,
    pub customer_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RefundRequest {
    pub reason: Option<String>,
}

/// Record a payment against an invoice
#[utoipa::path(
    post,
    path = "",
    tag = "payments",
    operation_id = "postApiPayments",
    request_body = RecordPaymentCommand,
    responses(
        (status = 201, description = "Payment recorded", body = CreatedResponse),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Invoice not found"),
        (status = 409, description = "Invoice void, paid or amount exceeds balance")
    ),
    security(("bearer_auth" = []))
)]
pub async fn record_payment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<RecordPaymentCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::PAYMENTS_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.payment_id))))
}

/// List payments
#[utoipa::path(
    get,
    path = "",
    tag = "payments",
    operation_id = "getApiPayments",
    params(PaginationParams, PaymentListParams),
    responses(
        (status = 200, description = "Payments", body = PaginatedResponse<PaymentResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_payments(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<PaymentListParams>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, PlatformError> {
    checks::require(&auth, permissions::PAYMENTS_READ)?;
    let query = ListPaymentsQuery {
        invoice_id: params.invoice_id,
        customer_id: params.customer_id,
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get a payment
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "payments",
    operation_id = "getApiPaymentsById",
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = PaymentResponse),
        (status = 404, description = "Payment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_payment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, PlatformError> {
    checks::require(&auth, permissions::PAYMENTS_READ)?;
    let payment = state.mediator.query(GetPaymentQuery { id }).await?;
    Ok(Json(payment.into()))
}

/// Refund a payment and reopen its invoice balance
#[utoipa::path(
    post,
    path = "/{id}/refund",
    tag = "payments",
    operation_id = "postApiPaymentsByIdRefund",
    params(("id" = String, Path, description = "Payment ID")),
    request_body = RefundRequest,
    responses(
        (status = 204, description = "Payment refunded"),
        (status = 404, description = "Payment not found"),
        (status = 409, description = "Payment already refunded")
    ),
    security(("bearer_auth" = []))
)]
pub async fn refund_payment(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<RefundRequest>>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::PAYMENTS_WRITE)?;
    let reason = body.and_then(|Json(req)| req.reason);
    let command = RefundPaymentCommand { payment_id: id, reason };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn payments_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(record_payment, list_payments))
        .routes(routes!(get_payment))
        .routes(routes!(refund_payment))
        .with_state(state)
}
