//! Customer API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{Address, Customer, CustomerNote};
use super::operations::{AddCustomerNoteCommand, CreateCustomerCommand, DeleteCustomerCommand, UpdateCustomerCommand};
use super::queries::{GetCustomerQuery, ListCustomersQuery};
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNoteResponse {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<CustomerNote> for CustomerNoteResponse {
    fn from(n: CustomerNote) -> Self {
        Self {
            id: n.id,
            text: n.text,
            author_id: n.author_id,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub notes: Vec<CustomerNoteResponse>,
    /// Whether the customer has a self-service login
    pub has_account: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            has_account: c.user_id.is_some(),
            id: c.id,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            phone: c.phone,
            address: c.address,
            notes: c.notes.into_iter().map(Into::into).collect(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    /// Name, email or phone fragment
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddNoteRequest {
    pub text: String,
}

/// Create a customer
#[utoipa::path(
    post,
    path = "",
    tag = "customers",
    operation_id = "postApiCustomers",
    request_body = CreateCustomerCommand,
    responses(
        (status = 201, description = "Customer created", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_customer(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<CreateCustomerCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::CUSTOMERS_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.customer_id))))
}

/// Search customers
#[utoipa::path(
    get,
    path = "",
    tag = "customers",
    operation_id = "getApiCustomers",
    params(PaginationParams, CustomerFilter),
    responses(
        (status = 200, description = "Customers", body = PaginatedResponse<CustomerResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_customers(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<CustomerFilter>,
) -> Result<Json<PaginatedResponse<CustomerResponse>>, PlatformError> {
    checks::require(&auth, permissions::CUSTOMERS_READ)?;
    let page = state
        .mediator
        .query(ListCustomersQuery {
            search: filter.search,
            page: pagination.page(),
            size: pagination.size(),
        })
        .await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get a customer
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "customers",
    operation_id = "getApiCustomersById",
    params(("id" = String, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer", body = CustomerResponse),
        (status = 404, description = "Customer not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_customer(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, PlatformError> {
    checks::require(&auth, permissions::CUSTOMERS_READ)?;
    let customer = state.mediator.query(GetCustomerQuery { id }).await?;
    Ok(Json(customer.into()))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "customers",
    operation_id = "putApiCustomersById",
    params(("id" = String, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_customer(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, PlatformError> {
    checks::require(&auth, permissions::CUSTOMERS_WRITE)?;
    let command = UpdateCustomerCommand {
        customer_id: id.clone(),
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        phone: req.phone,
        address: req.address,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    let customer = state.mediator.query(GetCustomerQuery { id }).await?;
    Ok(Json(customer.into()))
}

/// Delete a customer
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "customers",
    operation_id = "deleteApiCustomersById",
    params(("id" = String, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 409, description = "Customer has sales orders or an account")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_customer(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::CUSTOMERS_WRITE)?;
    state
        .mediator
        .send(DeleteCustomerCommand { customer_id: id }, auth.execution_context())
        .await
        .into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a note
#[utoipa::path(
    post,
    path = "/{id}/notes",
    tag = "customers",
    operation_id = "postApiCustomersByIdNotes",
    params(("id" = String, Path, description = "Customer ID")),
    request_body = AddNoteRequest,
    responses(
        (status = 201, description = "Note added", body = CreatedResponse),
        (status = 404, description = "Customer not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_note(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<AddNoteRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::CUSTOMERS_WRITE)?;
    let command = AddCustomerNoteCommand {
        customer_id: id,
        text: req.text,
    };
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.note_id))))
}

pub fn customers_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_customer, list_customers))
        .routes(routes!(get_customer, update_customer, delete_customer))
        .routes(routes!(add_note))
        .with_state(state)
}
