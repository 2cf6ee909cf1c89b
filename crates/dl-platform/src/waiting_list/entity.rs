//! Waiting List Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::HasId;
use crate::vehicle::entity::{Vehicle, VehicleCondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitingListStatus {
    Waiting,
    Notified,
    Fulfilled,
    Cancelled,
}

impl WaitingListStatus {
    /// Entries a customer still cares about.
    pub const ACTIVE: [WaitingListStatus; 2] = [WaitingListStatus::Waiting, WaitingListStatus::Notified];

    pub fn as_str(&self) -> &'static str {
        match self {
            WaitingListStatus::Waiting => "WAITING",
            WaitingListStatus::Notified => "NOTIFIED",
            WaitingListStatus::Fulfilled => "FULFILLED",
            WaitingListStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

/// A customer's standing request for a kind of vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListEntry {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    pub customer_id: String,
    pub make: String,

    /// `match_key(make)`, the value lookups by make compare against
    #[serde(default)]
    pub make_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price_cents: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<VehicleCondition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub status: WaitingListStatus,

    #[serde(default)]
    pub notified_vehicle_ids: Vec<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub notified_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilled_by_vehicle_id: Option<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Case-insensitive comparison key for makes and models. Matching and
/// the repository's make lookup both go through it.
pub fn match_key(value: &str) -> String {
    value.trim().to_lowercase()
}

impl WaitingListEntry {
    pub fn new(customer_id: impl Into<String>, make: impl Into<String>) -> Self {
        let now = Utc::now();
        let make = make.into();
        Self {
            id: TsidGenerator::generate(),
            version: 0,
            customer_id: customer_id.into(),
            make_key: match_key(&make),
            make,
            model: None,
            min_year: None,
            max_year: None,
            max_price_cents: None,
            condition: None,
            notes: None,
            status: WaitingListStatus::Waiting,
            notified_vehicle_ids: Vec::new(),
            notified_at: None,
            fulfilled_by_vehicle_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Same customer asking for the same make and model.
    pub fn is_same_request(&self, make: &str, model: Option<&str>) -> bool {
        match_key(&self.make) == match_key(make)
            && match (self.model.as_deref(), model) {
                (Some(a), Some(b)) => match_key(a) == match_key(b),
                (None, None) => true,
                _ => false,
            }
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if match_key(&self.make) != match_key(&vehicle.make) {
            return false;
        }
        if let Some(ref model) = self.model {
            if match_key(model) != match_key(&vehicle.model) {
                return false;
            }
        }
        if self.min_year.is_some_and(|min| vehicle.year < min) || self.max_year.is_some_and(|max| vehicle.year > max) {
            return false;
        }
        if self.max_price_cents.is_some_and(|max| vehicle.price_cents > max) {
            return false;
        }
        self.condition.map_or(true, |c| c == vehicle.condition)
    }

    pub fn notify(&mut self, vehicle_id: &str) {
        let now = Utc::now();
        self.status = WaitingListStatus::Notified;
        if !self.notified_vehicle_ids.iter().any(|id| id == vehicle_id) {
            self.notified_vehicle_ids.push(vehicle_id.to_string());
        }
        self.notified_at = Some(now);
        self.updated_at = now;
    }

    pub fn fulfill(&mut self, vehicle_id: Option<String>) {
        self.status = WaitingListStatus::Fulfilled;
        self.fulfilled_by_vehicle_id = vehicle_id;
        self.touch();
    }

    pub fn cancel(&mut self) {
        self.status = WaitingListStatus::Cancelled;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for WaitingListEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "waiting_list"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corolla(year: i32, price_cents: i64) -> Vehicle {
        Vehicle::new("2T1BURHE0JC074587", "Toyota", "Corolla", year, VehicleCondition::Used, price_cents)
    }

    #[test]
    fn test_matching_rules() {
        let mut entry = WaitingListEntry::new("C1", "toyota");
        assert!(entry.matches(&corolla(2019, 1_500_000)));

        entry.model = Some("COROLLA".into());
        entry.min_year = Some(2018);
        entry.max_year = Some(2020);
        entry.max_price_cents = Some(1_500_000);
        assert!(entry.matches(&corolla(2018, 1_500_000)));
        assert!(!entry.matches(&corolla(2021, 1_400_000)));
        assert!(!entry.matches(&corolla(2019, 1_500_001)));

        entry.condition = Some(VehicleCondition::New);
        assert!(!entry.matches(&corolla(2019, 1_000_000)));

        entry.condition = None;
        entry.model = Some("Camry".into());
        assert!(!entry.matches(&corolla(2019, 1_000_000)));
    }

    #[test]
    fn test_matching_folds_non_ascii_case() {
        let entry = WaitingListEntry::new("C1", "ŠKODA");
        assert_eq!(entry.make_key, "škoda");
        let octavia = Vehicle::new("TMBJJ7NE8L0123456", "Škoda", "Octavia", 2020, VehicleCondition::Used, 1_800_000);
        assert!(entry.matches(&octavia));
        assert!(entry.is_same_request("škoda", None));
    }

    #[test]
    fn test_same_request() {
        let mut entry = WaitingListEntry::new("C1", "Toyota");
        assert!(entry.is_same_request("TOYOTA", None));
        assert!(!entry.is_same_request("Toyota", Some("Corolla")));
        entry.model = Some("Corolla".into());
        assert!(entry.is_same_request("toyota", Some("corolla")));
    }

    #[test]
    fn test_notify_is_idempotent_per_vehicle() {
        let mut entry = WaitingListEntry::new("C1", "Toyota");
        entry.notify("V1");
        entry.notify("V1");
        assert_eq!(entry.status, WaitingListStatus::Notified);
        assert_eq!(entry.notified_vehicle_ids, vec!["V1".to_string()]);
    }
}
