//! Domain Event Trait
//!
//! Events follow the CloudEvents structure with extra fields for tracing
//! and ordering.
//!
//! - Event type: `dealerline:{domain}:{aggregate}:{action}`,
//!   e.g. `dealerline:sales:sales-order:confirmed`
//! - Subject: `{domain}.{aggregate}.{id}`, e.g. `sales.sales-order.0HZXEQ5Y8JY5Z`
//! - Message group: `{domain}:{aggregate}:{id}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ExecutionContext;
use crate::shared::tsid::TsidGenerator;

/// Application prefix of every event type and source.
pub const EVENT_APP: &str = "dealerline";

/// Current schema version of all event payloads.
pub const SPEC_VERSION: &str = "1.0";

/// Base trait for all domain events. Names are past tense (`VehicleCreated`).
pub trait DomainEvent: Send + Sync {
    fn event_id(&self) -> &str;
    fn event_type(&self) -> &str;
    fn spec_version(&self) -> &str;
    fn source(&self) -> &str;
    fn subject(&self) -> &str;
    fn time(&self) -> DateTime<Utc>;
    fn execution_id(&self) -> &str;
    fn correlation_id(&self) -> &str;
    fn causation_id(&self) -> Option<&str>;
    fn principal_id(&self) -> &str;
    fn message_group(&self) -> &str;

    /// Serialize the event payload to JSON.
    fn to_data_json(&self) -> String;
}

/// Common CloudEvents fields plus tracing context.
///
/// Events embed this as a flattened `metadata` field and delegate the trait
/// through [`impl_domain_event!`](crate::impl_domain_event).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_id: String,
    pub event_type: String,
    pub spec_version: String,
    pub source: String,
    pub subject: String,
    pub time: DateTime<Utc>,
    pub execution_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
    pub principal_id: String,
    pub message_group: String,
}

impl EventMetadata {
    /// Metadata for an event about one aggregate instance.
    ///
    /// `domain` and `aggregate` are lowercase kebab-case, `action` is the
    /// past-tense verb (`created`, `reserved`).
    pub fn for_aggregate(
        ctx: &ExecutionContext,
        domain: &str,
        aggregate: &str,
        action: &str,
        aggregate_id: &str,
    ) -> Self {
        Self {
            event_id: TsidGenerator::generate(),
            event_type: format!("{}:{}:{}:{}", EVENT_APP, domain, aggregate, action),
            spec_version: SPEC_VERSION.to_string(),
            source: format!("{}:{}", EVENT_APP, domain),
            subject: format!("{}.{}.{}", domain, aggregate, aggregate_id),
            time: Utc::now(),
            execution_id: ctx.execution_id.clone(),
            correlation_id: ctx.correlation_id.clone(),
            causation_id: ctx.causation_id.clone(),
            principal_id: ctx.principal_id.clone(),
            message_group: format!("{}:{}:{}", domain, aggregate, aggregate_id),
        }
    }

    /// Aggregate type from the subject, `sales.sales-order.X` gives `SalesOrder`.
    pub fn aggregate_type(&self) -> String {
        aggregate_type_from_subject(&self.subject)
    }
}

pub(crate) fn aggregate_type_from_subject(subject: &str) -> String {
    subject
        .split('.')
        .nth(1)
        .filter(|s| !s.is_empty())
        .map(|segment| {
            segment
                .split('-')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                        None => String::new(),
                    }
                })
                .collect()
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

pub(crate) fn entity_id_from_subject(subject: &str) -> Option<String> {
    subject.splitn(3, '.').nth(2).map(String::from)
}

/// Implement `DomainEvent` by delegating to a `metadata: EventMetadata` field.
#[macro_export]
macro_rules! impl_domain_event {
    ($event_type:ty) => {
        impl $crate::usecase::DomainEvent for $event_type {
            fn event_id(&self) -> &str {
                &self.metadata.event_id
            }

            fn event_type(&self) -> &str {
                &self.metadata.event_type
            }

            fn spec_version(&self) -> &str {
                &self.metadata.spec_version
            }

            fn source(&self) -> &str {
                &self.metadata.source
            }

            fn subject(&self) -> &str {
                &self.metadata.subject
            }

            fn time(&self) -> chrono::DateTime<chrono::Utc> {
                self.metadata.time
            }

            fn execution_id(&self) -> &str {
                &self.metadata.execution_id
            }

            fn correlation_id(&self) -> &str {
                &self.metadata.correlation_id
            }

            fn causation_id(&self) -> Option<&str> {
                self.metadata.causation_id.as_deref()
            }

            fn principal_id(&self) -> &str {
                &self.metadata.principal_id
            }

            fn message_group(&self) -> &str {
                &self.metadata.message_group
            }

            fn to_data_json(&self) -> String {
                serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct TestEvent {
        #[serde(flatten)]
        metadata: EventMetadata,
        test_field: String,
    }

    crate::impl_domain_event!(TestEvent);

    #[test]
    fn test_metadata_for_aggregate() {
        let ctx = ExecutionContext::create("user-1");
        let event = TestEvent {
            metadata: EventMetadata::for_aggregate(&ctx, "sales", "sales-order", "confirmed", "SO1"),
            test_field: "value".into(),
        };

        assert_eq!(event.event_type(), "dealerline:sales:sales-order:confirmed");
        assert_eq!(event.source(), "dealerline:sales");
        assert_eq!(event.subject(), "sales.sales-order.SO1");
        assert_eq!(event.message_group(), "sales:sales-order:SO1");
        assert_eq!(event.spec_version(), "1.0");
        assert_eq!(event.principal_id(), "user-1");
        assert_eq!(event.correlation_id(), ctx.correlation_id);
        assert_eq!(event.event_id().len(), 13);
        assert!(event.to_data_json().contains("\"testField\":\"value\""));
    }

    #[test]
    fn test_aggregate_type_from_subject() {
        assert_eq!(aggregate_type_from_subject("sales.sales-order.1"), "SalesOrder");
        assert_eq!(aggregate_type_from_subject("inventory.vehicle.1"), "Vehicle");
        assert_eq!(aggregate_type_from_subject("crm.waiting-list-entry.1"), "WaitingListEntry");
        assert_eq!(aggregate_type_from_subject(""), "Unknown");
    }

    #[test]
    fn test_entity_id_from_subject() {
        assert_eq!(entity_id_from_subject("iam.user.123"), Some("123".to_string()));
        assert_eq!(entity_id_from_subject("iam.user"), None);
    }
}
