//! Audit Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::{AuditLog, StoredEvent};
use super::repository::{AuditLogFilter, AuditLogRepository, EventRepository};
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetAuditLogQuery {
    pub id: String,
}

impl Query for GetAuditLogQuery {
    type Output = AuditLog;
}

#[derive(Debug, Clone, Default)]
pub struct ListAuditLogsQuery {
    pub filter: AuditLogFilter,
    pub page: u32,
    pub size: u32,
}

impl Query for ListAuditLogsQuery {
    type Output = Page<AuditLog>;
}

/// By `subject` or, failing that, by `correlation_id`.
#[derive(Debug, Clone, Default)]
pub struct ListEventsQuery {
    pub subject: Option<String>,
    pub correlation_id: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl Query for ListEventsQuery {
    type Output = Page<StoredEvent>;
}

pub struct AuditQueries {
    audit_logs: Arc<AuditLogRepository>,
    events: Arc<EventRepository>,
}

impl AuditQueries {
    pub fn new(audit_logs: Arc<AuditLogRepository>, events: Arc<EventRepository>) -> Self {
        Self { audit_logs, events }
    }
}

#[async_trait]
impl QueryHandler<GetAuditLogQuery> for AuditQueries {
    async fn handle(&self, query: GetAuditLogQuery) -> Result<AuditLog> {
        self.audit_logs
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("AuditLog", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListAuditLogsQuery> for AuditQueries {
    async fn handle(&self, query: ListAuditLogsQuery) -> Result<Page<AuditLog>> {
        if query.filter.entity_id.is_some() && query.filter.entity_type.is_none() {
            return Err(PlatformError::validation("entityId requires entityType"));
        }
        self.audit_logs.search(&query.filter, query.page, query.size).await
    }
}

#[async_trait]
impl QueryHandler<ListEventsQuery> for AuditQueries {
    async fn handle(&self, query: ListEventsQuery) -> Result<Page<StoredEvent>> {
        match (query.subject.as_deref(), query.correlation_id.as_deref()) {
            (Some(subject), _) => self.events.find_by_subject(subject, query.page, query.size).await,
            (None, Some(correlation_id)) => {
                self.events
                    .find_by_correlation(correlation_id, query.page, query.size)
                    .await
            }
            (None, None) => Err(PlatformError::validation("subject or correlationId is required")),
        }
    }
}
