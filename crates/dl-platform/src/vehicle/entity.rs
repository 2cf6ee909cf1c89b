//! Vehicle Entity

use std::sync::OnceLock;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Datelike, Utc};
use dl_common::money::{format_cents, MAX_AMOUNT_CENTS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::{HasId, UseCaseError};

pub const MIN_MODEL_YEAR: i32 = 1900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleCondition {
    New,
    Used,
    CertifiedPreOwned,
}

impl VehicleCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCondition::New => "NEW",
            VehicleCondition::Used => "USED",
            VehicleCondition::CertifiedPreOwned => "CERTIFIED_PRE_OWNED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    /// Held by a draft or confirmed sales order
    Reserved,
    Sold,
    InService,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 4] = [
        VehicleStatus::Available,
        VehicleStatus::Reserved,
        VehicleStatus::Sold,
        VehicleStatus::InService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::Reserved => "RESERVED",
            VehicleStatus::Sold => "SOLD",
            VehicleStatus::InService => "IN_SERVICE",
        }
    }
}

fn vin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 17 characters, I, O and Q excluded
    PATTERN.get_or_init(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap_or_else(|_| unreachable!("static pattern")))
}

/// Trimmed, uppercased VIN or `INVALID_VIN`.
pub fn normalize_vin(raw: &str) -> Result<String, UseCaseError> {
    let vin = raw.trim().to_uppercase();
    if !vin_pattern().is_match(&vin) {
        return Err(UseCaseError::validation(
            "INVALID_VIN",
            format!("'{}' is not a valid VIN: 17 characters, letters I, O and Q not allowed", vin),
        ));
    }
    Ok(vin)
}

/// Model years run from 1900 to next year.
pub fn validate_year(year: i32) -> Result<i32, UseCaseError> {
    let max = Utc::now().year() + 1;
    if !(MIN_MODEL_YEAR..=max).contains(&year) {
        return Err(UseCaseError::validation(
            "INVALID_YEAR",
            format!("Year must be between {} and {}", MIN_MODEL_YEAR, max),
        ));
    }
    Ok(year)
}

pub fn validate_price(price_cents: i64) -> Result<i64, UseCaseError> {
    if price_cents <= 0 {
        return Err(UseCaseError::validation("INVALID_PRICE", "Price must be greater than zero"));
    }
    if price_cents > MAX_AMOUNT_CENTS {
        return Err(UseCaseError::validation(
            "INVALID_PRICE",
            format!("Price must not exceed {}", format_cents(MAX_AMOUNT_CENTS)),
        ));
    }
    Ok(price_cents)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    /// Uppercase, unique
    pub vin: String,

    /// `STK-` prefixed, unique
    pub stock_number: String,

    pub make: String,
    pub model: String,
    pub year: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default)]
    pub mileage: i64,

    pub condition: VehicleCondition,

    pub price_cents: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub image_urls: Vec<String>,

    pub status: VehicleStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_by_order_id: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub sold_at: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(
        vin: impl Into<String>,
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        condition: VehicleCondition,
        price_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            version: 0,
            vin: vin.into(),
            stock_number: TsidGenerator::prefixed("STK"),
            make: make.into(),
            model: model.into(),
            year,
            trim: None,
            color: None,
            mileage: 0,
            condition,
            price_cents,
            description: None,
            features: Vec::new(),
            image_urls: Vec::new(),
            status: VehicleStatus::Available,
            reserved_by_order_id: None,
            sold_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    pub fn reserve(&mut self, order_id: &str) {
        self.status = VehicleStatus::Reserved;
        self.reserved_by_order_id = Some(order_id.to_string());
        self.touch();
    }

    /// Return a reserved vehicle to the lot.
    pub fn release(&mut self) {
        self.status = VehicleStatus::Available;
        self.reserved_by_order_id = None;
        self.touch();
    }

    pub fn mark_sold(&mut self) {
        self.status = VehicleStatus::Sold;
        self.sold_at = Some(Utc::now());
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for Vehicle {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "vehicles"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_vin() {
        assert_eq!(normalize_vin(" 1hgcm82633a004352 ").unwrap(), "1HGCM82633A004352");
        assert_eq!(normalize_vin("1HGCM82633A00435").unwrap_err().code(), "INVALID_VIN");
        // Letter O is never used in a VIN
        assert!(normalize_vin("1HGCM82633AO04352").is_err());
    }

    #[test]
    fn test_validate_year_and_price() {
        assert!(validate_year(1899).is_err());
        assert!(validate_year(1900).is_ok());
        assert!(validate_year(Utc::now().year() + 1).is_ok());
        assert!(validate_year(Utc::now().year() + 2).is_err());
        assert_eq!(validate_price(0).unwrap_err().code(), "INVALID_PRICE");
        assert!(validate_price(MAX_AMOUNT_CENTS).is_ok());
        assert_eq!(validate_price(MAX_AMOUNT_CENTS + 1).unwrap_err().code(), "INVALID_PRICE");
        assert!(validate_price(i64::MAX - 10).is_err());
    }

    #[test]
    fn test_reservation_lifecycle() {
        let mut v = Vehicle::new("1HGCM82633A004352", "Honda", "Accord", 2021, VehicleCondition::Used, 2_150_000);
        assert!(v.stock_number.starts_with("STK-"));
        assert_eq!(v.title(), "2021 Honda Accord");

        v.reserve("SO1");
        assert_eq!(v.status, VehicleStatus::Reserved);
        assert_eq!(v.reserved_by_order_id.as_deref(), Some("SO1"));

        v.release();
        assert!(v.is_available());
        assert!(v.reserved_by_order_id.is_none());

        v.mark_sold();
        assert!(v.sold_at.is_some());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&VehicleStatus::InService).unwrap(), "\"IN_SERVICE\"");
        assert_eq!(
            serde_json::to_string(&VehicleCondition::CertifiedPreOwned).unwrap(),
            "\"CERTIFIED_PRE_OWNED\""
        );
    }
}
