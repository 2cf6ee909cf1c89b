//! Waiting List Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::usecase::{EventMetadata, ExecutionContext};
use crate::waiting_list::entity::{WaitingListEntry, WaitingListStatus};

const DOMAIN: &str = "crm";
const AGGREGATE: &str = "waiting-list";

fn metadata(ctx: &ExecutionContext, action: &str, id: &str) -> EventMetadata {
    EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, action, id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListJoined {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub entry_id: String,
    pub customer_id: String,
    pub make: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl_domain_event!(WaitingListJoined);

impl WaitingListJoined {
    pub fn new(ctx: &ExecutionContext, entry: &WaitingListEntry) -> Self {
        Self {
            metadata: metadata(ctx, "joined", &entry.id),
            entry_id: entry.id.clone(),
            customer_id: entry.customer_id.clone(),
            make: entry.make.clone(),
            model: entry.model.clone(),
        }
    }
}

/// Emitted on leave and fulfil.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListEntryClosed {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub entry_id: String,
    pub customer_id: String,
    pub previous_status: WaitingListStatus,
    pub status: WaitingListStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
}

impl_domain_event!(WaitingListEntryClosed);

impl WaitingListEntryClosed {
    pub fn new(ctx: &ExecutionContext, entry: &WaitingListEntry, previous_status: WaitingListStatus) -> Self {
        let action = match entry.status {
            WaitingListStatus::Fulfilled => "fulfilled",
            _ => "left",
        };
        Self {
            metadata: metadata(ctx, action, &entry.id),
            entry_id: entry.id.clone(),
            customer_id: entry.customer_id.clone(),
            previous_status,
            status: entry.status,
            vehicle_id: entry.fulfilled_by_vehicle_id.clone(),
        }
    }
}

/// One event per stocked vehicle; its subject is the vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListNotified {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub vehicle_id: String,
    pub entry_ids: Vec<String>,
    pub customer_ids: Vec<String>,
}

impl_domain_event!(WaitingListNotified);

impl WaitingListNotified {
    pub fn new(ctx: &ExecutionContext, vehicle_id: &str, entries: &[WaitingListEntry]) -> Self {
        Self {
            metadata: metadata(ctx, "notified", vehicle_id),
            vehicle_id: vehicle_id.to_string(),
            entry_ids: entries.iter().map(|e| e.id.clone()).collect(),
            customer_ids: entries.iter().map(|e| e.customer_id.clone()).collect(),
        }
    }
}
