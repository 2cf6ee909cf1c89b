//! Vehicle APIs
//!
//! Staff inventory management under /api/vehicles and the public showroom
//! under /api/showroom/vehicles (available vehicles only, no auth).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{Vehicle, VehicleCondition, VehicleStatus};
use super::operations::{
    CreateVehicleCommand, DeleteVehicleCommand, SetVehicleAvailabilityCommand, UpdateVehicleCommand,
};
use super::queries::{GetVehicleQuery, ListVehiclesQuery};
use super::repository::VehicleFilter;
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: String,
    pub vin: String,
    pub stock_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub mileage: i64,
    pub condition: VehicleCondition,
    pub price_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub features: Vec<String>,
    pub image_urls: Vec<String>,
    pub status: VehicleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_by_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sold_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(v: Vehicle) -> Self {
        Self {
            id: v.id,
            vin: v.vin,
            stock_number: v.stock_number,
            make: v.make,
            model: v.model,
            year: v.year,
            trim: v.trim,
            color: v.color,
            mileage: v.mileage,
            condition: v.condition,
            price_cents: v.price_cents,
            description: v.description,
            features: v.features,
            image_urls: v.image_urls,
            status: v.status,
            reserved_by_order_id: v.reserved_by_order_id,
            sold_at: v.sold_at,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// Public listing; internal bookkeeping fields are left out.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShowroomVehicle {
    pub id: String,
    pub stock_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub mileage: i64,
    pub condition: VehicleCondition,
    pub price_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub features: Vec<String>,
    pub image_urls: Vec<String>,
}

impl From<Vehicle> for ShowroomVehicle {
    fn from(v: Vehicle) -> Self {
        Self {
            id: v.id,
            stock_number: v.stock_number,
            make: v.make,
            model: v.model,
            year: v.year,
            trim: v.trim,
            color: v.color,
            mileage: v.mileage,
            condition: v.condition,
            price_cents: v.price_cents,
            description: v.description,
            features: v.features,
            image_urls: v.image_urls,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VehicleSearchParams {
    pub status: Option<VehicleStatus>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub condition: Option<VehicleCondition>,
    /// Minimum price in cents
    pub min_price: Option<i64>,
    /// Maximum price in cents
    pub max_price: Option<i64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    /// Free-text search over make, model, trim, VIN and stock number
    pub search: Option<String>,
}

impl VehicleSearchParams {
    fn into_filter(self) -> VehicleFilter {
        VehicleFilter {
            status: self.status,
            make: self.make,
            model: self.model,
            condition: self.condition,
            min_price_cents: self.min_price,
            max_price_cents: self.max_price,
            min_year: self.min_year,
            max_year: self.max_year,
            search: self.search,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub trim: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<i64>,
    pub condition: Option<VehicleCondition>,
    pub price_cents: Option<i64>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    /// AVAILABLE or IN_SERVICE
    pub status: VehicleStatus,
}

/// Add a vehicle to inventory
#[utoipa::path(
    post,
    path = "",
    tag = "vehicles",
    operation_id = "postApiVehicles",
    request_body = CreateVehicleCommand,
    responses(
        (status = 201, description = "Vehicle created", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "VIN already in inventory")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_vehicle(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<CreateVehicleCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::VEHICLES_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.vehicle_id))))
}

/// Search inventory
#[utoipa::path(
    get,
    path = "",
    tag = "vehicles",
    operation_id = "getApiVehicles",
    params(PaginationParams, VehicleSearchParams),
    responses(
        (status = 200, description = "Vehicles", body = PaginatedResponse<VehicleResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_vehicles(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<VehicleSearchParams>,
) -> Result<Json<PaginatedResponse<VehicleResponse>>, PlatformError> {
    checks::require(&auth, permissions::VEHICLES_READ)?;
    let page = state
        .mediator
        .query(ListVehiclesQuery {
            filter: params.into_filter(),
            page: pagination.page(),
            size: pagination.size(),
        })
        .await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get a vehicle
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "vehicles",
    operation_id = "getApiVehiclesById",
    params(("id" = String, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle", body = VehicleResponse),
        (status = 404, description = "Vehicle not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_vehicle(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<VehicleResponse>, PlatformError> {
    checks::require(&auth, permissions::VEHICLES_READ)?;
    let vehicle = state.mediator.query(GetVehicleQuery { id }).await?;
    Ok(Json(vehicle.into()))
}

/// Update listing details
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "vehicles",
    operation_id = "putApiVehiclesById",
    params(("id" = String, Path, description = "Vehicle ID")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = VehicleResponse),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle is sold")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_vehicle(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateVehicleRequest>,
) -> Result<Json<VehicleResponse>, PlatformError> {
    checks::require(&auth, permissions::VEHICLES_WRITE)?;
    let command = UpdateVehicleCommand {
        vehicle_id: id.clone(),
        make: req.make,
        model: req.model,
        year: req.year,
        trim: req.trim,
        color: req.color,
        mileage: req.mileage,
        condition: req.condition,
        price_cents: req.price_cents,
        description: req.description,
        features: req.features,
        image_urls: req.image_urls,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    let vehicle = state.mediator.query(GetVehicleQuery { id }).await?;
    Ok(Json(vehicle.into()))
}

/// Toggle between AVAILABLE and IN_SERVICE
#[utoipa::path(
    put,
    path = "/{id}/availability",
    tag = "vehicles",
    operation_id = "putApiVehiclesByIdAvailability",
    params(("id" = String, Path, description = "Vehicle ID")),
    request_body = AvailabilityRequest,
    responses(
        (status = 204, description = "Availability changed"),
        (status = 409, description = "Vehicle is reserved, sold or already in that state")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_availability(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::VEHICLES_WRITE)?;
    let command = SetVehicleAvailabilityCommand {
        vehicle_id: id,
        status: req.status,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a vehicle from inventory
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "vehicles",
    operation_id = "deleteApiVehiclesById",
    params(("id" = String, Path, description = "Vehicle ID")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 409, description = "Vehicle is reserved or sold")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_vehicle(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::VEHICLES_WRITE)?;
    state
        .mediator
        .send(DeleteVehicleCommand { vehicle_id: id }, auth.execution_context())
        .await
        .into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Browse available vehicles
#[utoipa::path(
    get,
    path = "",
    tag = "showroom",
    operation_id = "getApiShowroomVehicles",
    params(PaginationParams, VehicleSearchParams),
    responses(
        (status = 200, description = "Available vehicles", body = PaginatedResponse<ShowroomVehicle>)
    )
)]
pub async fn list_showroom(
    State(state): State<MediatorState>,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<VehicleSearchParams>,
) -> Result<Json<PaginatedResponse<ShowroomVehicle>>, PlatformError> {
    let mut filter = params.into_filter();
    filter.status = Some(VehicleStatus::Available);
    let page = state
        .mediator
        .query(ListVehiclesQuery {
            filter,
            page: pagination.page(),
            size: pagination.size(),
        })
        .await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Show an available vehicle
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "showroom",
    operation_id = "getApiShowroomVehiclesById",
    params(("id" = String, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle", body = ShowroomVehicle),
        (status = 404, description = "Not found or not for sale")
    )
)]
pub async fn get_showroom_vehicle(
    State(state): State<MediatorState>,
    Path(id): Path<String>,
) -> Result<Json<ShowroomVehicle>, PlatformError> {
    let vehicle = state.mediator.query(GetVehicleQuery { id: id.clone() }).await?;
    if !vehicle.is_available() {
        return Err(PlatformError::not_found("Vehicle", id));
    }
    Ok(Json(vehicle.into()))
}

pub fn vehicles_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_vehicle, list_vehicles))
        .routes(routes!(get_vehicle, update_vehicle, delete_vehicle))
        .routes(routes!(set_availability))
        .with_state(state)
}

pub fn showroom_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_showroom))
        .routes(routes!(get_showroom_vehicle))
        .with_state(state)
}
