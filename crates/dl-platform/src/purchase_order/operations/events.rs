//! Purchase Order Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::purchase_order::entity::{PurchaseOrder, PurchaseOrderStatus};
use crate::usecase::{EventMetadata, ExecutionContext};

const DOMAIN: &str = "purchasing";
const AGGREGATE: &str = "purchase-order";

fn metadata(ctx: &ExecutionContext, action: &str, order_id: &str) -> EventMetadata {
    EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, action, order_id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub order_number: String,
    pub supplier: String,
    pub line_count: usize,
    pub total_cost_cents: i64,
}

impl_domain_event!(PurchaseOrderCreated);

impl PurchaseOrderCreated {
    pub fn new(ctx: &ExecutionContext, order: &PurchaseOrder) -> Self {
        Self {
            metadata: metadata(ctx, "created", &order.id),
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            supplier: order.supplier.clone(),
            line_count: order.lines.len(),
            total_cost_cents: order.total_cost_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderUpdated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub supplier: String,
    pub line_count: usize,
    pub previous_total_cost_cents: i64,
    pub total_cost_cents: i64,
}

impl_domain_event!(PurchaseOrderUpdated);

impl PurchaseOrderUpdated {
    pub fn new(ctx: &ExecutionContext, order: &PurchaseOrder, previous_total_cost_cents: i64) -> Self {
        Self {
            metadata: metadata(ctx, "updated", &order.id),
            order_id: order.id.clone(),
            supplier: order.supplier.clone(),
            line_count: order.lines.len(),
            previous_total_cost_cents,
            total_cost_cents: order.total_cost_cents,
        }
    }
}

/// Emitted on submit, receive and cancel. `vehicle_ids` is filled on receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderStatusChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub previous_status: PurchaseOrderStatus,
    pub status: PurchaseOrderStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vehicle_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl_domain_event!(PurchaseOrderStatusChanged);

impl PurchaseOrderStatusChanged {
    pub fn new(ctx: &ExecutionContext, order: &PurchaseOrder, previous_status: PurchaseOrderStatus) -> Self {
        let action = match order.status {
            PurchaseOrderStatus::Submitted => "submitted",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
            PurchaseOrderStatus::Draft => "reopened",
        };
        Self {
            metadata: metadata(ctx, action, &order.id),
            order_id: order.id.clone(),
            previous_status,
            status: order.status,
            vehicle_ids: order.lines.iter().filter_map(|l| l.vehicle_id.clone()).collect(),
            reason: order.cancellation_reason.clone(),
        }
    }
}
