//! Audit Admin API
//!
//! Read-only views over the audit trail and the stored event stream.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{AuditLog, StoredEvent};
use super::queries::{GetAuditLogQuery, ListAuditLogsQuery, ListEventsQuery};
use super::repository::AuditLogFilter;
use crate::shared::api_common::{MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: String,
    pub operation: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub principal_id: Option<String>,
    pub event_id: String,
    pub correlation_id: String,
    pub performed_at: DateTime<Utc>,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id,
            operation: log.operation,
            entity_type: log.entity_type,
            entity_id: log.entity_id,
            principal_id: log.principal_id,
            event_id: log.event_id,
            correlation_id: log.correlation_id,
            performed_at: log.performed_at,
        }
    }
}

/// Single entry, including the command payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogDetailResponse {
    #[serde(flatten)]
    pub summary: AuditLogResponse,
    pub operation_json: Option<String>,
}

impl From<AuditLog> for AuditLogDetailResponse {
    fn from(mut log: AuditLog) -> Self {
        let operation_json = log.operation_json.take();
        Self {
            summary: log.into(),
            operation_json,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub event_type: String,
    pub source: String,
    pub subject: String,
    pub aggregate_type: String,
    pub spec_version: String,
    pub time: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub message_group: String,
    pub execution_id: String,
    pub correlation_id: String,
    pub causation_id: Option<String>,
    pub principal_id: String,
}

impl From<StoredEvent> for EventResponse {
    fn from(e: StoredEvent) -> Self {
        Self {
            id: e.id,
            event_type: e.event_type,
            source: e.source,
            subject: e.subject,
            aggregate_type: e.aggregate_type,
            spec_version: e.spec_version,
            time: e.time,
            data: e.data,
            message_group: e.message_group,
            execution_id: e.execution_id,
            correlation_id: e.correlation_id,
            causation_id: e.causation_id,
            principal_id: e.principal_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditLogParams {
    /// Aggregate type, e.g. `SalesOrder`
    pub entity_type: Option<String>,
    /// Requires `entityType`
    pub entity_id: Option<String>,
    pub principal_id: Option<String>,
    /// Command name, e.g. `ConfirmSalesOrderCommand`
    pub operation: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventParams {
    /// `domain.aggregate.id`
    pub subject: Option<String>,
    pub correlation_id: Option<String>,
}

/// List audit log entries, newest first
#[utoipa::path(
    get,
    path = "/logs",
    tag = "audit",
    operation_id = "getApiAuditLogs",
    params(PaginationParams, AuditLogParams),
    responses(
        (status = 200, description = "Audit log entries", body = PaginatedResponse<AuditLogResponse>),
        (status = 400, description = "entityId without entityType")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_audit_logs(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<AuditLogParams>,
) -> Result<Json<PaginatedResponse<AuditLogResponse>>, PlatformError> {
    checks::require(&auth, permissions::AUDIT_READ)?;
    let query = ListAuditLogsQuery {
        filter: AuditLogFilter {
            entity_type: params.entity_type,
            entity_id: params.entity_id,
            principal_id: params.principal_id,
            operation: params.operation,
        },
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get one audit log entry
#[utoipa::path(
    get,
    path = "/logs/{id}",
    tag = "audit",
    operation_id = "getApiAuditLogsById",
    params(("id" = String, Path, description = "Audit log ID")),
    responses(
        (status = 200, description = "Audit log entry", body = AuditLogDetailResponse),
        (status = 404, description = "Audit log not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_audit_log(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AuditLogDetailResponse>, PlatformError> {
    checks::require(&auth, permissions::AUDIT_READ)?;
    let log = state.mediator.query(GetAuditLogQuery { id }).await?;
    Ok(Json(log.into()))
}

/// List stored events by subject or correlation id
#[utoipa::path(
    get,
    path = "/events",
    tag = "audit",
    operation_id = "getApiAuditEvents",
    params(PaginationParams, EventParams),
    responses(
        (status = 200, description = "Events, oldest first", body = PaginatedResponse<EventResponse>),
        (status = 400, description = "Neither subject nor correlationId given")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<EventParams>,
) -> Result<Json<PaginatedResponse<EventResponse>>, PlatformError> {
    checks::require(&auth, permissions::AUDIT_READ)?;
    let query = ListEventsQuery {
        subject: params.subject,
        correlation_id: params.correlation_id,
        page: pagination.page(),
        size: pagination.size(),
    };
    let page = state.mediator.query(query).await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

pub fn audit_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_audit_logs))
        .routes(routes!(get_audit_log))
        .routes(routes!(list_events))
        .with_state(state)
}
