//! Appointment Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::Appointment;
use super::repository::{AppointmentFilter, AppointmentRepository};
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetAppointmentQuery {
    pub id: String,
}

impl Query for GetAppointmentQuery {
    type Output = Appointment;
}

#[derive(Debug, Clone, Default)]
pub struct ListAppointmentsQuery {
    pub filter: AppointmentFilter,
    pub page: u32,
    pub size: u32,
}

impl Query for ListAppointmentsQuery {
    type Output = Page<Appointment>;
}

pub struct AppointmentQueries {
    appointments: Arc<AppointmentRepository>,
}

impl AppointmentQueries {
    pub fn new(appointments: Arc<AppointmentRepository>) -> Self {
        Self { appointments }
    }
}

#[async_trait]
impl QueryHandler<GetAppointmentQuery> for AppointmentQueries {
    async fn handle(&self, query: GetAppointmentQuery) -> Result<Appointment> {
        self.appointments
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Appointment", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListAppointmentsQuery> for AppointmentQueries {
    async fn handle(&self, query: ListAppointmentsQuery) -> Result<Page<Appointment>> {
        if let (Some(from), Some(to)) = (query.filter.from, query.filter.to) {
            if from > to {
                return Err(PlatformError::validation("'from' must not be after 'to'"));
            }
        }
        self.appointments.search(&query.filter, query.page, query.size).await
    }
}
