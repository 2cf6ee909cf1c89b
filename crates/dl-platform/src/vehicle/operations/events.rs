//! Vehicle Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::usecase::{EventMetadata, ExecutionContext};
use crate::vehicle::entity::{Vehicle, VehicleStatus};

const DOMAIN: &str = "inventory";
const AGGREGATE: &str = "vehicle";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub vehicle_id: String,
    pub vin: String,
    pub stock_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_cents: i64,
}

impl_domain_event!(VehicleCreated);

impl VehicleCreated {
    pub fn new(ctx: &ExecutionContext, v: &Vehicle) -> Self {
        Self {
            metadata: EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, "created", &v.id),
            vehicle_id: v.id.clone(),
            vin: v.vin.clone(),
            stock_number: v.stock_number.clone(),
            make: v.make.clone(),
            model: v.model.clone(),
            year: v.year,
            price_cents: v.price_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub vehicle_id: String,
    pub price_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_price_cents: Option<i64>,
}

impl_domain_event!(VehicleUpdated);

impl VehicleUpdated {
    pub fn new(ctx: &ExecutionContext, v: &Vehicle, previous_price_cents: Option<i64>) -> Self {
        Self {
            metadata: EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, "updated", &v.id),
            vehicle_id: v.id.clone(),
            price_cents: v.price_cents,
            previous_price_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleAvailabilityChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub vehicle_id: String,
    pub previous_status: VehicleStatus,
    pub status: VehicleStatus,
}

impl_domain_event!(VehicleAvailabilityChanged);

impl VehicleAvailabilityChanged {
    pub fn new(ctx: &ExecutionContext, v: &Vehicle, previous_status: VehicleStatus) -> Self {
        Self {
            metadata: EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, "availability-changed", &v.id),
            vehicle_id: v.id.clone(),
            previous_status,
            status: v.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDeleted {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub vehicle_id: String,
    pub vin: String,
}

impl_domain_event!(VehicleDeleted);

impl VehicleDeleted {
    pub fn new(ctx: &ExecutionContext, v: &Vehicle) -> Self {
        Self {
            metadata: EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, "deleted", &v.id),
            vehicle_id: v.id.clone(),
            vin: v.vin.clone(),
        }
    }
}
