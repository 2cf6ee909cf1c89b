//! Appointment Domain Events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::appointment::entity::{Appointment, AppointmentKind, AppointmentStatus};
use crate::impl_domain_event;
use crate::usecase::{EventMetadata, ExecutionContext};

const DOMAIN: &str = "crm";
const AGGREGATE: &str = "appointment";

fn metadata(ctx: &ExecutionContext, action: &str, id: &str) -> EventMetadata {
    EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, action, id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentScheduled {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub appointment_id: String,
    pub customer_id: String,
    pub kind: AppointmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl_domain_event!(AppointmentScheduled);

impl AppointmentScheduled {
    pub fn new(ctx: &ExecutionContext, appt: &Appointment) -> Self {
        Self {
            metadata: metadata(ctx, "scheduled", &appt.id),
            appointment_id: appt.id.clone(),
            customer_id: appt.customer_id.clone(),
            kind: appt.kind,
            staff_id: appt.staff_id.clone(),
            vehicle_id: appt.vehicle_id.clone(),
            start_at: appt.start_at,
            duration_minutes: appt.duration_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRescheduled {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub appointment_id: String,
    pub previous_start_at: DateTime<Utc>,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
}

impl_domain_event!(AppointmentRescheduled);

impl AppointmentRescheduled {
    pub fn new(ctx: &ExecutionContext, appt: &Appointment, previous_start_at: DateTime<Utc>) -> Self {
        Self {
            metadata: metadata(ctx, "rescheduled", &appt.id),
            appointment_id: appt.id.clone(),
            previous_start_at,
            start_at: appt.start_at,
            duration_minutes: appt.duration_minutes,
            staff_id: appt.staff_id.clone(),
        }
    }
}

/// Confirm, complete, cancel and no-show.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStatusChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub appointment_id: String,
    pub customer_id: String,
    pub previous_status: AppointmentStatus,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl_domain_event!(AppointmentStatusChanged);

impl AppointmentStatusChanged {
    pub fn new(ctx: &ExecutionContext, appt: &Appointment, previous_status: AppointmentStatus) -> Self {
        let action = match appt.status {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
            AppointmentStatus::Scheduled => "scheduled",
        };
        Self {
            metadata: metadata(ctx, action, &appt.id),
            appointment_id: appt.id.clone(),
            customer_id: appt.customer_id.clone(),
            previous_status,
            status: appt.status,
            reason: appt.cancellation_reason.clone(),
        }
    }
}
