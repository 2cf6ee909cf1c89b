//! Audit trail and the persisted event stream.

pub mod api;
pub mod entity;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{AuditLog, StoredEvent};
pub use repository::{AuditLogFilter, AuditLogRepository, EventRepository};

use crate::mediator::Mediator;
use crate::Repositories;
use queries::{AuditQueries, GetAuditLogQuery, ListAuditLogsQuery, ListEventsQuery};

pub fn register(mediator: &mut Mediator, repos: &Repositories) {
    let queries = Arc::new(AuditQueries::new(repos.audit_logs.clone(), repos.events.clone()));
    mediator.register_query::<GetAuditLogQuery, _>(queries.clone());
    mediator.register_query::<ListAuditLogsQuery, _>(queries.clone());
    mediator.register_query::<ListEventsQuery, _>(queries);
}
