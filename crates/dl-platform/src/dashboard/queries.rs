//! Dashboard Summary Query

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use dl_common::money::checked_sum;
use serde::Serialize;
use utoipa::ToSchema;

use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::sales_order::entity::SalesOrderStatus;
use crate::vehicle::entity::VehicleStatus;
use crate::Repositories;

pub const UPCOMING_APPOINTMENT_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy)]
pub struct GetDashboardSummaryQuery {
    /// Reference instant; the current time in production
    pub now: DateTime<Utc>,
}

impl Default for GetDashboardSummaryQuery {
    fn default() -> Self {
        Self { now: Utc::now() }
    }
}

impl Query for GetDashboardSummaryQuery {
    type Output = DashboardSummary;
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatusCount {
    pub status: VehicleStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub vehicles_by_status: Vec<VehicleStatusCount>,
    /// Sum of list prices of `AVAILABLE` vehicles
    pub available_inventory_value_cents: i64,
    pub open_sales_orders: u64,
    pub sales_this_month: u64,
    pub revenue_this_month_cents: i64,
    pub outstanding_invoices: u64,
    pub outstanding_balance_cents: i64,
    pub overdue_invoices: u64,
    pub open_service_orders: u64,
    pub upcoming_appointments: u64,
    pub active_waiting_list_entries: u64,
}

/// `[first of this month, first of next month)` in UTC.
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let start = Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0).single().unwrap_or(now);
    let end = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single().unwrap_or(now);
    (start, end)
}

fn money_error(e: dl_common::money::MoneyError) -> PlatformError {
    PlatformError::internal(format!("Dashboard total out of range: {}", e))
}

pub struct DashboardQueries {
    repos: Repositories,
}

impl DashboardQueries {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn vehicles_by_status(&self) -> Result<Vec<VehicleStatusCount>> {
        let mut counts = Vec::with_capacity(VehicleStatus::ALL.len());
        for status in VehicleStatus::ALL {
            let count = self.repos.vehicles.count_by_status(status).await?;
            counts.push(VehicleStatusCount { status, count });
        }
        Ok(counts)
    }
}

#[async_trait]
impl QueryHandler<GetDashboardSummaryQuery> for DashboardQueries {
    async fn handle(&self, query: GetDashboardSummaryQuery) -> Result<DashboardSummary> {
        let now = query.now;
        let repos = &self.repos;
        let (month_start, month_end) = month_bounds(now);
        let (vehicles_by_status, available, open_sales_orders, completed, outstanding, overdue, open_service, upcoming, waiting) =
            tokio::try_join!(
                self.vehicles_by_status(),
                repos.vehicles.find_by_status(VehicleStatus::Available),
                repos
                    .sales_orders
                    .count_by_status(&[SalesOrderStatus::Draft, SalesOrderStatus::Confirmed]),
                repos.sales_orders.find_completed_between(month_start, month_end),
                repos.invoices.find_outstanding(),
                repos.invoices.count_overdue(now),
                repos.service_orders.count_active(),
                repos
                    .appointments
                    .count_active_between(now, now + Duration::days(UPCOMING_APPOINTMENT_DAYS)),
                repos.waiting_list.count_active(),
            )?;

        Ok(DashboardSummary {
            vehicles_by_status,
            available_inventory_value_cents: checked_sum(available.iter().map(|v| v.price_cents))
                .map_err(money_error)?,
            open_sales_orders,
            sales_this_month: completed.len() as u64,
            revenue_this_month_cents: checked_sum(completed.iter().map(|o| o.total_cents)).map_err(money_error)?,
            outstanding_invoices: outstanding.len() as u64,
            outstanding_balance_cents: checked_sum(outstanding.iter().map(|i| i.balance_cents()))
                .map_err(money_error)?,
            overdue_invoices: overdue,
            open_service_orders: open_service,
            upcoming_appointments: upcoming,
            active_waiting_list_entries: waiting,
        })
    }
}
