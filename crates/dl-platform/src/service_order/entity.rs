//! Service Order Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::HasId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceOrderStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceOrderStatus {
    pub const ACTIVE: [ServiceOrderStatus; 2] = [ServiceOrderStatus::Open, ServiceOrderStatus::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceOrderStatus::Open => "OPEN",
            ServiceOrderStatus::InProgress => "IN_PROGRESS",
            ServiceOrderStatus::Completed => "COMPLETED",
            ServiceOrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTask {
    pub id: String,
    pub description: String,
    /// Tenths of an hour, so 15 = 1.5 h
    pub labor_hours_tenths: u32,
    /// Per hour
    pub labor_rate_cents: i64,
    pub parts_cost_cents: i64,
}

impl ServiceTask {
    /// Labor charge rounded half up to the cent.
    pub fn labor_cents(&self) -> i64 {
        let tenths = self.labor_hours_tenths as i128 * self.labor_rate_cents as i128;
        ((tenths + 5) / 10) as i64
    }

    pub fn hours(&self) -> String {
        format!("{}.{}", self.labor_hours_tenths / 10, self.labor_hours_tenths % 10)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    /// `SVC-<tsid>`
    pub order_number: String,

    pub customer_id: String,
    pub vin: String,

    /// Set when the vehicle is dealer inventory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,

    pub complaint: String,

    #[serde(default)]
    pub tasks: Vec<ServiceTask>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<String>,

    pub status: ServiceOrderStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl ServiceOrder {
    pub fn open(customer_id: impl Into<String>, vin: impl Into<String>, complaint: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            version: 0,
            order_number: TsidGenerator::prefixed("SVC"),
            customer_id: customer_id.into(),
            vin: vin.into(),
            vehicle_id: None,
            complaint: complaint.into(),
            tasks: Vec::new(),
            technician_id: None,
            status: ServiceOrderStatus::Open,
            cancellation_reason: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_task(
        &mut self,
        description: impl Into<String>,
        labor_hours_tenths: u32,
        labor_rate_cents: i64,
        parts_cost_cents: i64,
    ) -> &ServiceTask {
        self.tasks.push(ServiceTask {
            id: TsidGenerator::generate(),
            description: description.into(),
            labor_hours_tenths,
            labor_rate_cents,
            parts_cost_cents,
        });
        self.touch();
        &self.tasks[self.tasks.len() - 1]
    }

    /// Returns the removed task, if it existed.
    pub fn remove_task(&mut self, task_id: &str) -> Option<ServiceTask> {
        let index = self.tasks.iter().position(|t| t.id == task_id)?;
        self.touch();
        Some(self.tasks.remove(index))
    }

    pub fn labor_total_cents(&self) -> i64 {
        self.tasks.iter().map(ServiceTask::labor_cents).sum()
    }

    pub fn parts_total_cents(&self) -> i64 {
        self.tasks.iter().map(|t| t.parts_cost_cents).sum()
    }

    pub fn start(&mut self) {
        let now = Utc::now();
        self.status = ServiceOrderStatus::InProgress;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    pub fn complete(&mut self) {
        let now = Utc::now();
        self.status = ServiceOrderStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn cancel(&mut self, reason: Option<String>) {
        self.status = ServiceOrderStatus::Cancelled;
        self.cancellation_reason = reason;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for ServiceOrder {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "service_orders"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}
