//! Sales Order Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use dl_common::money::{non_negative, validate_rate, MoneyError, Totals};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::HasId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesOrderStatus {
    Draft,
    Confirmed,
    Completed,
    Cancelled,
}

impl SalesOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesOrderStatus::Draft => "DRAFT",
            SalesOrderStatus::Confirmed => "CONFIRMED",
            SalesOrderStatus::Completed => "COMPLETED",
            SalesOrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Draft and confirmed orders hold their vehicle.
    pub fn is_open(&self) -> bool {
        matches!(self, SalesOrderStatus::Draft | SalesOrderStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    /// `SO-<tsid>`
    pub order_number: String,

    pub customer_id: String,
    pub vehicle_id: String,
    pub salesperson_id: String,

    pub status: SalesOrderStatus,

    /// Vehicle list price when the order was written
    pub vehicle_price_cents: i64,
    pub discount_cents: i64,
    pub trade_in_cents: i64,
    pub tax_rate_bps: u32,

    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub confirmed_at: Option<DateTime<Utc>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub cancelled_at: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Price the deal: subtotal after discount and trade-in, then tax.
///
/// The subtotal may not go below zero; a trade-in worth more than the
/// vehicle is settled outside the order.
pub fn price_order(
    vehicle_price_cents: i64,
    discount_cents: i64,
    trade_in_cents: i64,
    tax_rate_bps: u32,
) -> Result<Totals, MoneyError> {
    let vehicle_price_cents = non_negative(vehicle_price_cents)?;
    let discount_cents = non_negative(discount_cents)?;
    let trade_in_cents = non_negative(trade_in_cents)?;
    let tax_rate_bps = validate_rate(tax_rate_bps)?;

    let subtotal = vehicle_price_cents
        .checked_sub(discount_cents)
        .and_then(|v| v.checked_sub(trade_in_cents))
        .ok_or(MoneyError::Overflow)?;
    let subtotal = non_negative(subtotal)?;
    Totals::with_tax(subtotal, tax_rate_bps)
}

impl SalesOrder {
    /// A draft order with no discount or trade-in.
    pub fn new(
        customer_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        salesperson_id: impl Into<String>,
        vehicle_price_cents: i64,
        tax_rate_bps: u32,
    ) -> Result<Self, MoneyError> {
        let now = Utc::now();
        let totals = price_order(vehicle_price_cents, 0, 0, tax_rate_bps)?;
        Ok(Self {
            id: TsidGenerator::generate(),
            version: 0,
            order_number: TsidGenerator::prefixed("SO"),
            customer_id: customer_id.into(),
            vehicle_id: vehicle_id.into(),
            salesperson_id: salesperson_id.into(),
            status: SalesOrderStatus::Draft,
            vehicle_price_cents,
            discount_cents: 0,
            trade_in_cents: 0,
            tax_rate_bps,
            subtotal_cents: totals.subtotal_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            notes: None,
            cancellation_reason: None,
            confirmed_at: None,
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the price components and recompute totals.
    pub fn set_pricing(
        &mut self,
        vehicle_price_cents: i64,
        discount_cents: i64,
        trade_in_cents: i64,
        tax_rate_bps: u32,
    ) -> Result<(), MoneyError> {
        let totals = price_order(vehicle_price_cents, discount_cents, trade_in_cents, tax_rate_bps)?;
        self.vehicle_price_cents = vehicle_price_cents;
        self.discount_cents = discount_cents;
        self.trade_in_cents = trade_in_cents;
        self.tax_rate_bps = tax_rate_bps;
        self.subtotal_cents = totals.subtotal_cents;
        self.tax_cents = totals.tax_cents;
        self.total_cents = totals.total_cents;
        self.touch();
        Ok(())
    }

    pub fn totals(&self) -> Totals {
        Totals {
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
        }
    }

    pub fn confirm(&mut self) {
        self.status = SalesOrderStatus::Confirmed;
        self.confirmed_at = Some(Utc::now());
        self.touch();
    }

    pub fn complete(&mut self) {
        self.status = SalesOrderStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn cancel(&mut self, reason: Option<String>) {
        self.status = SalesOrderStatus::Cancelled;
        self.cancellation_reason = reason;
        self.cancelled_at = Some(Utc::now());
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for SalesOrder {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "sales_orders"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_order() {
        // 25,000 - 1,000 discount - 4,000 trade-in, 8.25% tax
        let totals = price_order(2_500_000, 100_000, 400_000, 825).unwrap();
        assert_eq!(totals.subtotal_cents, 2_000_000);
        assert_eq!(totals.tax_cents, 165_000);
        assert_eq!(totals.total_cents, 2_165_000);
    }

    #[test]
    fn test_price_order_rejects_bad_input() {
        assert_eq!(price_order(1_000, 600, 600, 0), Err(MoneyError::Negative(-200)));
        assert_eq!(price_order(1_000, -1, 0, 0), Err(MoneyError::Negative(-1)));
        assert_eq!(price_order(1_000, 0, 0, 9_000), Err(MoneyError::RateTooHigh(9_000)));
        assert_eq!(price_order(i64::MAX - 10, 0, 0, 5_000), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_lifecycle() {
        let mut order = SalesOrder::new("C1", "V1", "S1", 1_000_000, 500).unwrap();
        assert!(order.order_number.starts_with("SO-"));
        assert_eq!(order.total_cents, 1_050_000);
        assert!(order.status.is_open());

        order.confirm();
        assert!(order.confirmed_at.is_some());
        order.cancel(Some("financing fell through".into()));
        assert_eq!(order.status, SalesOrderStatus::Cancelled);
        assert!(!order.status.is_open());
    }
}
