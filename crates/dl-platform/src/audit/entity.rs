//! Audit log and stored event entities.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::tsid::TsidGenerator;
use crate::usecase::domain_event::{aggregate_type_from_subject, entity_id_from_subject};
use crate::usecase::{DomainEvent, HasId};

/// One entry per committed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    #[serde(rename = "_id")]
    pub id: String,

    /// Aggregate type, e.g. `SalesOrder`
    pub entity_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Command type name, e.g. `ConfirmSalesOrderCommand`
    pub operation: String,

    /// Command serialized as JSON (secrets are skipped at serialization)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_json: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,

    pub event_id: String,
    pub correlation_id: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub performed_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn from_command<E: DomainEvent, C: Serialize>(event: &E, command: &C) -> Self {
        let operation = std::any::type_name::<C>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown")
            .to_string();

        Self {
            id: TsidGenerator::generate(),
            entity_type: aggregate_type_from_subject(event.subject()),
            entity_id: entity_id_from_subject(event.subject()),
            operation,
            operation_json: serde_json::to_string(command).ok(),
            principal_id: Some(event.principal_id().to_string()),
            event_id: event.event_id().to_string(),
            correlation_id: event.correlation_id().to_string(),
            performed_at: event.time(),
        }
    }
}

impl HasId for AuditLog {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "audit_logs"
    }
}

/// Persisted domain event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    /// Same as the domain event id
    #[serde(rename = "_id")]
    pub id: String,

    pub event_type: String,
    pub source: String,
    pub subject: String,
    pub aggregate_type: String,
    pub spec_version: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub time: DateTime<Utc>,

    /// Event payload
    #[serde(default)]
    pub data: serde_json::Value,

    pub message_group: String,
    pub execution_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
    pub principal_id: String,
}

impl StoredEvent {
    pub fn from_event<E: DomainEvent>(event: &E) -> Self {
        let data = serde_json::from_str(&event.to_data_json()).unwrap_or(serde_json::json!({}));
        Self {
            id: event.event_id().to_string(),
            event_type: event.event_type().to_string(),
            source: event.source().to_string(),
            subject: event.subject().to_string(),
            aggregate_type: aggregate_type_from_subject(event.subject()),
            spec_version: event.spec_version().to_string(),
            time: event.time(),
            data,
            message_group: event.message_group().to_string(),
            execution_id: event.execution_id().to_string(),
            correlation_id: event.correlation_id().to_string(),
            causation_id: event.causation_id().map(String::from),
            principal_id: event.principal_id().to_string(),
        }
    }
}

impl HasId for StoredEvent {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "events"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::{EventMetadata, ExecutionContext};

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct PriceChanged {
        #[serde(flatten)]
        metadata: EventMetadata,
        price_cents: i64,
    }
    crate::impl_domain_event!(PriceChanged);

    #[derive(Serialize)]
    struct ChangePriceCommand {
        vehicle_id: String,
        #[serde(skip_serializing)]
        #[allow(dead_code)]
        secret: String,
    }

    #[test]
    fn test_audit_log_from_command() {
        let ctx = ExecutionContext::create("user-9");
        let event = PriceChanged {
            metadata: EventMetadata::for_aggregate(&ctx, "inventory", "vehicle", "updated", "V1"),
            price_cents: 100,
        };
        let command = ChangePriceCommand { vehicle_id: "V1".into(), secret: "hunter2".into() };

        let log = AuditLog::from_command(&event, &command);
        assert_eq!(log.entity_type, "Vehicle");
        assert_eq!(log.entity_id.as_deref(), Some("V1"));
        assert_eq!(log.operation, "ChangePriceCommand");
        assert_eq!(log.principal_id.as_deref(), Some("user-9"));
        let json = log.operation_json.unwrap();
        assert!(json.contains("V1"));
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_stored_event_keeps_payload() {
        let ctx = ExecutionContext::create("user-9");
        let event = PriceChanged {
            metadata: EventMetadata::for_aggregate(&ctx, "inventory", "vehicle", "updated", "V1"),
            price_cents: 4200,
        };

        let stored = StoredEvent::from_event(&event);
        assert_eq!(stored.id, event.metadata.event_id);
        assert_eq!(stored.aggregate_type, "Vehicle");
        assert_eq!(stored.data["priceCents"], serde_json::json!(4200));
    }
}
