//! Service Order Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::service_order::entity::{ServiceOrder, ServiceOrderStatus, ServiceTask};
use crate::usecase::{EventMetadata, ExecutionContext};

const DOMAIN: &str = "service";
const AGGREGATE: &str = "service-order";

fn metadata(ctx: &ExecutionContext, action: &str, order_id: &str) -> EventMetadata {
    EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, action, order_id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderOpened {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub order_number: String,
    pub customer_id: String,
    pub vin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
}

impl_domain_event!(ServiceOrderOpened);

impl ServiceOrderOpened {
    pub fn new(ctx: &ExecutionContext, order: &ServiceOrder) -> Self {
        Self {
            metadata: metadata(ctx, "opened", &order.id),
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            customer_id: order.customer_id.clone(),
            vin: order.vin.clone(),
            vehicle_id: order.vehicle_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTaskAdded {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub task_id: String,
    pub description: String,
    pub labor_cents: i64,
    pub parts_cost_cents: i64,
}

impl_domain_event!(ServiceTaskAdded);

impl ServiceTaskAdded {
    pub fn new(ctx: &ExecutionContext, order_id: &str, task: &ServiceTask) -> Self {
        Self {
            metadata: metadata(ctx, "task-added", order_id),
            order_id: order_id.to_string(),
            task_id: task.id.clone(),
            description: task.description.clone(),
            labor_cents: task.labor_cents(),
            parts_cost_cents: task.parts_cost_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTaskRemoved {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub task_id: String,
}

impl_domain_event!(ServiceTaskRemoved);

impl ServiceTaskRemoved {
    pub fn new(ctx: &ExecutionContext, order_id: &str, task_id: &str) -> Self {
        Self {
            metadata: metadata(ctx, "task-removed", order_id),
            order_id: order_id.to_string(),
            task_id: task_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianAssigned {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub technician_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_technician_id: Option<String>,
}

impl_domain_event!(TechnicianAssigned);

impl TechnicianAssigned {
    pub fn new(ctx: &ExecutionContext, order: &ServiceOrder, previous_technician_id: Option<String>) -> Self {
        Self {
            metadata: metadata(ctx, "technician-assigned", &order.id),
            order_id: order.id.clone(),
            technician_id: order.technician_id.clone().unwrap_or_default(),
            previous_technician_id,
        }
    }
}

/// Emitted on start, complete and cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderStatusChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    pub previous_status: ServiceOrderStatus,
    pub status: ServiceOrderStatus,
    pub labor_total_cents: i64,
    pub parts_total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl_domain_event!(ServiceOrderStatusChanged);

impl ServiceOrderStatusChanged {
    pub fn new(ctx: &ExecutionContext, order: &ServiceOrder, previous_status: ServiceOrderStatus) -> Self {
        let action = match order.status {
            ServiceOrderStatus::InProgress => "started",
            ServiceOrderStatus::Completed => "completed",
            ServiceOrderStatus::Cancelled => "cancelled",
            ServiceOrderStatus::Open => "reopened",
        };
        Self {
            metadata: metadata(ctx, action, &order.id),
            order_id: order.id.clone(),
            vehicle_id: order.vehicle_id.clone(),
            previous_status,
            status: order.status,
            labor_total_cents: order.labor_total_cents(),
            parts_total_cents: order.parts_total_cents(),
            reason: order.cancellation_reason.clone(),
        }
    }
}
