//! Appointment Repository

use std::sync::Arc;

use bson::{doc, Document};
use chrono::{DateTime, Utc};

use super::entity::{Appointment, AppointmentStatus};
use crate::shared::error::Result;
use crate::store::{DocumentStore, FindOptions, Page, TypedCollection};
use crate::usecase::HasId;

fn active_statuses() -> Vec<&'static str> {
    AppointmentStatus::ACTIVE.iter().map(|s| s.as_str()).collect()
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub customer_id: Option<String>,
    pub staff_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    /// Appointments starting at or after
    pub from: Option<DateTime<Utc>>,
    /// Appointments starting before
    pub to: Option<DateTime<Utc>>,
}

impl AppointmentFilter {
    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(ref customer_id) = self.customer_id {
            filter.insert("customerId", customer_id.as_str());
        }
        if let Some(ref staff_id) = self.staff_id {
            filter.insert("staffId", staff_id.as_str());
        }
        if let Some(ref vehicle_id) = self.vehicle_id {
            filter.insert("vehicleId", vehicle_id.as_str());
        }
        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        let mut range = Document::new();
        if let Some(from) = self.from {
            range.insert("$gte", bson::DateTime::from_chrono(from));
        }
        if let Some(to) = self.to {
            range.insert("$lt", bson::DateTime::from_chrono(to));
        }
        if !range.is_empty() {
            filter.insert("startAt", range);
        }
        filter
    }
}

pub struct AppointmentRepository {
    collection: TypedCollection<Appointment>,
}

impl AppointmentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, Appointment::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>> {
        self.collection.find_by_id(id).await
    }

    /// Soonest first.
    pub async fn search(&self, filter: &AppointmentFilter, page: u32, size: u32) -> Result<Page<Appointment>> {
        self.collection
            .find_page(filter.to_document(), doc! { "startAt": 1 }, page, size)
            .await
    }

    /// Active appointments on `staff_id` or `vehicle_id` whose slot
    /// overlaps `[start, end)`, other than `exclude_id`.
    pub async fn find_conflicts(
        &self,
        staff_id: Option<&str>,
        vehicle_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<Vec<Appointment>> {
        let mut owners = Vec::new();
        if let Some(staff_id) = staff_id {
            owners.push(doc! { "staffId": staff_id });
        }
        if let Some(vehicle_id) = vehicle_id {
            owners.push(doc! { "vehicleId": vehicle_id });
        }
        if owners.is_empty() {
            return Ok(Vec::new());
        }

        let mut filter = doc! {
            "status": { "$in": active_statuses() },
            "startAt": { "$lt": bson::DateTime::from_chrono(end) },
            "endAt": { "$gt": bson::DateTime::from_chrono(start) },
            "$or": owners,
        };
        if let Some(exclude_id) = exclude_id {
            filter.insert("_id", doc! { "$ne": exclude_id });
        }
        self.collection.find(filter, FindOptions::sorted(doc! { "startAt": 1 })).await
    }

    /// Active appointments starting within `[from, to)`.
    pub async fn count_active_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<u64> {
        self.collection
            .count(doc! {
                "status": { "$in": active_statuses() },
                "startAt": {
                    "$gte": bson::DateTime::from_chrono(from),
                    "$lt": bson::DateTime::from_chrono(to),
                },
            })
            .await
    }
}
