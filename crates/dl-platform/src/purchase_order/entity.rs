//! Purchase Order Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use dl_common::money::{self, MoneyError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::HasId;
use crate::vehicle::entity::{Vehicle, VehicleCondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Draft,
    Submitted,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "DRAFT",
            PurchaseOrderStatus::Submitted => "SUBMITTED",
            PurchaseOrderStatus::Received => "RECEIVED",
            PurchaseOrderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// One vehicle bought from the supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLine {
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub condition: VehicleCondition,
    pub unit_cost_cents: i64,
    /// Sticker price of the vehicle once on the lot
    pub list_price_cents: i64,
    /// Inventory vehicle created on receipt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
}

impl PurchaseOrderLine {
    pub fn to_vehicle(&self) -> Vehicle {
        let mut vehicle = Vehicle::new(
            self.vin.as_str(),
            self.make.as_str(),
            self.model.as_str(),
            self.year,
            self.condition,
            self.list_price_cents,
        );
        vehicle.color = self.color.clone();
        vehicle
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    /// `PO-<tsid>`
    pub order_number: String,

    pub supplier: String,
    pub lines: Vec<PurchaseOrderLine>,
    pub total_cost_cents: i64,
    pub status: PurchaseOrderStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_by: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub received_at: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn new(
        supplier: impl Into<String>,
        lines: Vec<PurchaseOrderLine>,
        created_by: impl Into<String>,
    ) -> Result<Self, MoneyError> {
        let now = Utc::now();
        let mut order = Self {
            id: TsidGenerator::generate(),
            version: 0,
            order_number: TsidGenerator::prefixed("PO"),
            supplier: supplier.into(),
            lines: Vec::new(),
            total_cost_cents: 0,
            status: PurchaseOrderStatus::Draft,
            notes: None,
            created_by: created_by.into(),
            cancellation_reason: None,
            submitted_at: None,
            received_at: None,
            created_at: now,
            updated_at: now,
        };
        order.set_lines(lines)?;
        Ok(order)
    }

    pub fn set_lines(&mut self, lines: Vec<PurchaseOrderLine>) -> Result<(), MoneyError> {
        self.total_cost_cents = money::checked_sum(lines.iter().map(|l| l.unit_cost_cents))?;
        self.lines = lines;
        self.touch();
        Ok(())
    }

    pub fn submit(&mut self) {
        let now = Utc::now();
        self.status = PurchaseOrderStatus::Submitted;
        self.submitted_at = Some(now);
        self.updated_at = now;
    }

    /// Marks the order received and returns one new inventory vehicle per line.
    pub fn receive(&mut self) -> Vec<Vehicle> {
        let vehicles: Vec<Vehicle> = self.lines.iter().map(PurchaseOrderLine::to_vehicle).collect();
        for (line, vehicle) in self.lines.iter_mut().zip(&vehicles) {
            line.vehicle_id = Some(vehicle.id.clone());
        }
        let now = Utc::now();
        self.status = PurchaseOrderStatus::Received;
        self.received_at = Some(now);
        self.updated_at = now;
        vehicles
    }

    pub fn cancel(&mut self, reason: Option<String>) {
        self.status = PurchaseOrderStatus::Cancelled;
        self.cancellation_reason = reason;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for PurchaseOrder {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "purchase_orders"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::entity::VehicleStatus;

    fn line(vin: &str, cost: i64) -> PurchaseOrderLine {
        PurchaseOrderLine {
            vin: vin.into(),
            make: "Mazda".into(),
            model: "CX-5".into(),
            year: 2024,
            color: Some("Soul Red".into()),
            condition: VehicleCondition::New,
            unit_cost_cents: cost,
            list_price_cents: cost + 400_000,
            vehicle_id: None,
        }
    }

    #[test]
    fn test_total_cost() {
        let order = PurchaseOrder::new(
            "Mazda Distribution",
            vec![line("JM3KFBCM1R0100001", 2_800_000), line("JM3KFBCM1R0100002", 2_900_000)],
            "staff-1",
        )
        .unwrap();
        assert!(order.order_number.starts_with("PO-"));
        assert_eq!(order.total_cost_cents, 5_700_000);
        assert_eq!(order.status, PurchaseOrderStatus::Draft);
    }

    #[test]
    fn test_receive_creates_available_vehicles() {
        let mut order = PurchaseOrder::new("Mazda Distribution", vec![line("JM3KFBCM1R0100001", 2_800_000)], "staff-1")
            .unwrap();
        order.submit();
        let vehicles = order.receive();

        assert_eq!(order.status, PurchaseOrderStatus::Received);
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].status, VehicleStatus::Available);
        assert_eq!(vehicles[0].price_cents, 3_200_000);
        assert_eq!(vehicles[0].color.as_deref(), Some("Soul Red"));
        assert_eq!(order.lines[0].vehicle_id.as_deref(), Some(vehicles[0].id.as_str()));
    }
}
