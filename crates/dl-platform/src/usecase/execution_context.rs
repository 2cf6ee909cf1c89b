//! Execution Context
//!
//! Carries tracing IDs and the acting principal through a use case.

use chrono::{DateTime, Utc};

use super::domain_event::DomainEvent;
use crate::shared::tsid::TsidGenerator;

/// Principal id used for work the platform does on its own behalf.
pub const SYSTEM_PRINCIPAL: &str = "system";

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution
    pub execution_id: String,
    /// Shared by every execution that stems from the same request
    pub correlation_id: String,
    /// Event that triggered this execution, if any
    pub causation_id: Option<String>,
    pub principal_id: String,
    pub initiated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Fresh context; the correlation id starts as the execution id.
    pub fn create(principal_id: impl Into<String>) -> Self {
        let exec_id = format!("exec-{}", TsidGenerator::generate());
        Self {
            execution_id: exec_id.clone(),
            correlation_id: exec_id,
            causation_id: None,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    pub fn system() -> Self {
        Self::create(SYSTEM_PRINCIPAL)
    }

    /// Context that joins an upstream correlation id (e.g. `X-Correlation-ID`).
    pub fn with_correlation(
        principal_id: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: format!("exec-{}", TsidGenerator::generate()),
            correlation_id: correlation_id.into(),
            causation_id: None,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    /// New execution reacting to `parent`: keeps the correlation id and
    /// records the parent event as the cause.
    pub fn from_parent_event<E: DomainEvent + ?Sized>(
        parent: &E,
        principal_id: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: format!("exec-{}", TsidGenerator::generate()),
            correlation_id: parent.correlation_id().to_string(),
            causation_id: Some(parent.event_id().to_string()),
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.principal_id == SYSTEM_PRINCIPAL
    }
}
