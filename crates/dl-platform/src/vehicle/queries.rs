//! Vehicle Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::Vehicle;
use super::repository::{VehicleFilter, VehicleRepository};
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetVehicleQuery {
    pub id: String,
}

impl Query for GetVehicleQuery {
    type Output = Vehicle;
}

#[derive(Debug, Clone, Default)]
pub struct ListVehiclesQuery {
    pub filter: VehicleFilter,
    pub page: u32,
    pub size: u32,
}

impl Query for ListVehiclesQuery {
    type Output = Page<Vehicle>;
}

pub struct VehicleQueries {
    vehicles: Arc<VehicleRepository>,
}

impl VehicleQueries {
    pub fn new(vehicles: Arc<VehicleRepository>) -> Self {
        Self { vehicles }
    }
}

#[async_trait]
impl QueryHandler<GetVehicleQuery> for VehicleQueries {
    async fn handle(&self, query: GetVehicleQuery) -> Result<Vehicle> {
        self.vehicles
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Vehicle", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListVehiclesQuery> for VehicleQueries {
    async fn handle(&self, query: ListVehiclesQuery) -> Result<Page<Vehicle>> {
        if let (Some(min), Some(max)) = (query.filter.min_price_cents, query.filter.max_price_cents) {
            if min > max {
                return Err(PlatformError::validation("minPrice must not exceed maxPrice"));
            }
        }
        self.vehicles.search(&query.filter, query.page, query.size).await
    }
}
