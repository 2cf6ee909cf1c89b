//! Appointment Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::HasId;

pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentKind {
    TestDrive,
    ServiceDropOff,
    Consultation,
    Delivery,
}

impl AppointmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentKind::TestDrive => "TEST_DRIVE",
            AppointmentKind::ServiceDropOff => "SERVICE_DROP_OFF",
            AppointmentKind::Consultation => "CONSULTATION",
            AppointmentKind::Delivery => "DELIVERY",
        }
    }

    /// Kinds a customer may book for themselves.
    pub fn is_self_service(&self) -> bool {
        matches!(self, AppointmentKind::TestDrive | AppointmentKind::Consultation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Appointments that still hold their slot.
    pub const ACTIVE: [AppointmentStatus; 2] = [AppointmentStatus::Scheduled, AppointmentStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    pub customer_id: String,
    pub kind: AppointmentKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_at: DateTime<Utc>,

    /// Stored so overlap checks can run as a range query
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_at: DateTime<Utc>,

    pub duration_minutes: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub status: AppointmentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    /// Principal that made the booking
    pub booked_by: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(
        customer_id: impl Into<String>,
        kind: AppointmentKind,
        start_at: DateTime<Utc>,
        duration_minutes: u32,
        booked_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            version: 0,
            customer_id: customer_id.into(),
            kind,
            staff_id: None,
            vehicle_id: None,
            start_at,
            end_at: end_of(start_at, duration_minutes),
            duration_minutes,
            notes: None,
            status: AppointmentStatus::Scheduled,
            cancellation_reason: None,
            booked_by: booked_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Half-open interval overlap with `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_at < end && start < self.end_at
    }

    pub fn reschedule(&mut self, start_at: DateTime<Utc>, duration_minutes: u32) {
        self.start_at = start_at;
        self.duration_minutes = duration_minutes;
        self.end_at = end_of(start_at, duration_minutes);
        // A moved appointment needs confirming again
        self.status = AppointmentStatus::Scheduled;
        self.touch();
    }

    pub fn set_status(&mut self, status: AppointmentStatus) {
        self.status = status;
        self.touch();
    }

    pub fn cancel(&mut self, reason: String) {
        self.status = AppointmentStatus::Cancelled;
        self.cancellation_reason = Some(reason);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

pub fn end_of(start_at: DateTime<Utc>, duration_minutes: u32) -> DateTime<Utc> {
    start_at + Duration::minutes(duration_minutes as i64)
}

impl HasId for Appointment {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "appointments"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_overlap_is_half_open() {
        let start = Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap();
        let appt = Appointment::new("C1", AppointmentKind::TestDrive, start, 60, "staff-1");
        assert_eq!(appt.end_at, Utc.with_ymd_and_hms(2030, 5, 1, 11, 0, 0).unwrap());

        // Back-to-back slots do not collide
        assert!(!appt.overlaps(appt.end_at, end_of(appt.end_at, 30)));
        assert!(!appt.overlaps(start - Duration::minutes(30), start));
        assert!(appt.overlaps(start + Duration::minutes(59), end_of(start, 120)));
        assert!(appt.overlaps(start - Duration::minutes(10), start + Duration::minutes(1)));
    }

    #[test]
    fn test_reschedule_resets_confirmation() {
        let start = Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap();
        let mut appt = Appointment::new("C1", AppointmentKind::Consultation, start, 30, "C1");
        appt.set_status(AppointmentStatus::Confirmed);
        appt.reschedule(start + Duration::days(1), 45);
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert_eq!(appt.end_at, end_of(start + Duration::days(1), 45));
    }
}
