//! Sales Order Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::sales_order::entity::{SalesOrder, SalesOrderStatus};
use crate::usecase::{EventMetadata, ExecutionContext};

const DOMAIN: &str = "sales";
const AGGREGATE: &str = "sales-order";

fn metadata(ctx: &ExecutionContext, action: &str, order_id: &str) -> EventMetadata {
    EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, action, order_id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub order_number: String,
    pub customer_id: String,
    pub vehicle_id: String,
    pub salesperson_id: String,
    pub total_cents: i64,
}

impl_domain_event!(SalesOrderCreated);

impl SalesOrderCreated {
    pub fn new(ctx: &ExecutionContext, order: &SalesOrder) -> Self {
        Self {
            metadata: metadata(ctx, "created", &order.id),
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            customer_id: order.customer_id.clone(),
            vehicle_id: order.vehicle_id.clone(),
            salesperson_id: order.salesperson_id.clone(),
            total_cents: order.total_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderPricingUpdated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub vehicle_price_cents: i64,
    pub discount_cents: i64,
    pub trade_in_cents: i64,
    pub tax_rate_bps: u32,
    pub previous_total_cents: i64,
    pub total_cents: i64,
}

impl_domain_event!(SalesOrderPricingUpdated);

impl SalesOrderPricingUpdated {
    pub fn new(ctx: &ExecutionContext, order: &SalesOrder, previous_total_cents: i64) -> Self {
        Self {
            metadata: metadata(ctx, "pricing-updated", &order.id),
            order_id: order.id.clone(),
            vehicle_price_cents: order.vehicle_price_cents,
            discount_cents: order.discount_cents,
            trade_in_cents: order.trade_in_cents,
            tax_rate_bps: order.tax_rate_bps,
            previous_total_cents,
            total_cents: order.total_cents,
        }
    }
}

/// Emitted on confirm, complete and cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderStatusChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub order_id: String,
    pub vehicle_id: String,
    pub previous_status: SalesOrderStatus,
    pub status: SalesOrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl_domain_event!(SalesOrderStatusChanged);

impl SalesOrderStatusChanged {
    pub fn new(ctx: &ExecutionContext, order: &SalesOrder, previous_status: SalesOrderStatus) -> Self {
        let action = match order.status {
            SalesOrderStatus::Confirmed => "confirmed",
            SalesOrderStatus::Completed => "completed",
            SalesOrderStatus::Cancelled => "cancelled",
            SalesOrderStatus::Draft => "reopened",
        };
        Self {
            metadata: metadata(ctx, action, &order.id),
            order_id: order.id.clone(),
            vehicle_id: order.vehicle_id.clone(),
            previous_status,
            status: order.status,
            reason: order.cancellation_reason.clone(),
        }
    }
}
