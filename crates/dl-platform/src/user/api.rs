//! Users Admin API
//!
//! - GET/POST /api/users
//! - GET/PUT /api/users/{id}
//! - POST /api/users/{id}/activate | /deactivate

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{User, UserRole};
use super::operations::{
    ActivateUserCommand, CreateUserCommand, DeactivateUserCommand, UpdateUserCommand,
};
use super::permissions;
use super::queries::{GetUserQuery, ListUsersQuery};
use crate::shared::api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams};
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            role: u.role,
            active: u.active,
            customer_id: u.customer_id,
            last_login_at: u.last_login_at,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateUserRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

/// Create a staff user
#[utoipa::path(
    post,
    path = "",
    tag = "users",
    operation_id = "postApiUsers",
    request_body = CreateUserCommand,
    responses(
        (status = 201, description = "User created", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Json(command): Json<CreateUserCommand>,
) -> Result<(StatusCode, Json<CreatedResponse>), PlatformError> {
    checks::require(&auth, permissions::USERS_WRITE)?;
    let event = state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(event.user_id))))
}

/// List users
#[utoipa::path(
    get,
    path = "",
    tag = "users",
    operation_id = "getApiUsers",
    params(PaginationParams, UserFilter),
    responses(
        (status = 200, description = "Users", body = PaginatedResponse<UserResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<PaginatedResponse<UserResponse>>, PlatformError> {
    checks::require(&auth, permissions::USERS_READ)?;
    let page = state
        .mediator
        .query(ListUsersQuery {
            role: filter.role,
            active: filter.active,
            page: pagination.page(),
            size: pagination.size(),
        })
        .await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "users",
    operation_id = "getApiUsersById",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, PlatformError> {
    checks::require(&auth, permissions::USERS_READ)?;
    let user = state.mediator.query(GetUserQuery { id }).await?;
    Ok(Json(user.into()))
}

/// Update display name or role
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "users",
    operation_id = "putApiUsersById",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Last administrator")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, PlatformError> {
    checks::require(&auth, permissions::USERS_WRITE)?;
    let command = UpdateUserCommand {
        user_id: id.clone(),
        display_name: req.display_name,
        role: req.role,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    let user = state.mediator.query(GetUserQuery { id }).await?;
    Ok(Json(user.into()))
}

/// Deactivate a user and revoke their sessions
#[utoipa::path(
    post,
    path = "/{id}/deactivate",
    tag = "users",
    operation_id = "postApiUsersByIdDeactivate",
    params(("id" = String, Path, description = "User ID")),
    request_body = DeactivateUserRequest,
    responses(
        (status = 204, description = "User deactivated"),
        (status = 409, description = "Self-deactivation, last admin or already inactive")
    ),
    security(("bearer_auth" = []))
)]
pub async fn deactivate_user(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<DeactivateUserRequest>>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::USERS_WRITE)?;
    let reason = body.and_then(|Json(b)| b.reason);
    let command = DeactivateUserCommand { user_id: id, reason };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reactivate a user
#[utoipa::path(
    post,
    path = "/{id}/activate",
    tag = "users",
    operation_id = "postApiUsersByIdActivate",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User activated"),
        (status = 409, description = "Already active")
    ),
    security(("bearer_auth" = []))
)]
pub async fn activate_user(
    State(state): State<MediatorState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    checks::require(&auth, permissions::USERS_WRITE)?;
    state
        .mediator
        .send(ActivateUserCommand { user_id: id }, auth.execution_context())
        .await
        .into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn users_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_user, list_users))
        .routes(routes!(get_user, update_user))
        .routes(routes!(deactivate_user))
        .routes(routes!(activate_user))
        .with_state(state)
}
