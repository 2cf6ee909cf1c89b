//! Auth API Endpoints
//!
//! - POST /auth/login - password login, sets the session cookie
//! - POST /auth/refresh - rotate a refresh token
//! - POST /auth/logout - revoke sessions, clear the cookie
//! - POST /auth/register - customer self-registration
//! - POST /auth/password - change own password
//! - GET /auth/me - current caller

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::session_service::{SessionService, SessionTokens};
use crate::mediator::Mediator;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::operations::{ChangePasswordCommand, RegisterCustomerAccountCommand};
use crate::user::UserRole;
use crate::usecase::ExecutionContext;

pub const DEFAULT_SESSION_COOKIE: &str = "dl_session";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// Token pair returned by login and refresh
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: SessionUser,
}

impl From<SessionTokens> for TokenResponse {
    fn from(tokens: SessionTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in,
            user: SessionUser {
                id: tokens.user.id,
                email: tokens.user.email,
                display_name: tokens.user.display_name,
                role: tokens.user.role,
                customer_id: tokens.user.customer_id,
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    /// Revoke only this session; all sessions when absent
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    pub customer_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub permissions: Vec<String>,
}

#[derive(Clone)]
pub struct AuthApiState {
    pub sessions: Arc<SessionService>,
    pub mediator: Arc<Mediator>,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,
    /// Cookie lifetime, matches the access token lifetime
    pub session_cookie_max_age_secs: i64,
}

impl AuthApiState {
    pub fn new(sessions: Arc<SessionService>, mediator: Arc<Mediator>, access_token_ttl_secs: i64) -> Self {
        Self {
            sessions,
            mediator,
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            session_cookie_secure: false,
            session_cookie_max_age_secs: access_token_ttl_secs,
        }
    }

    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    fn session_cookie(&self, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((self.session_cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.session_cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }
}

/// Login with email and password
///
/// Returns an access/refresh token pair and sets the session cookie.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postAuthLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn login(
    State(state): State<AuthApiState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, PlatformError> {
    let tokens = state.sessions.login(&req.email, &req.password).await?;
    let cookie = state.session_cookie(tokens.access_token.clone(), state.session_cookie_max_age_secs);
    Ok((jar.add(cookie), Json(TokenResponse::from(tokens))))
}

/// Exchange a refresh token for a new pair
///
/// The presented token is retired. Presenting a retired token again
/// revokes every token of its family.
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "auth",
    operation_id = "postAuthRefresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Invalid, expired or reused refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AuthApiState>,
    jar: CookieJar,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, PlatformError> {
    let tokens = state.sessions.refresh(&req.refresh_token).await?;
    let cookie = state.session_cookie(tokens.access_token.clone(), state.session_cookie_max_age_secs);
    Ok((jar.add(cookie), Json(TokenResponse::from(tokens))))
}

/// Logout
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    operation_id = "postAuthLogout",
    request_body = LogoutRequest,
    responses(
        (status = 204, description = "Logged out")
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AuthApiState>,
    jar: CookieJar,
    auth: Authenticated,
    body: Option<Json<LogoutRequest>>,
) -> Result<impl IntoResponse, PlatformError> {
    let refresh_token = body.and_then(|Json(b)| b.refresh_token);
    state.sessions.logout(&auth.principal_id, refresh_token.as_deref()).await?;

    let cleared = state.session_cookie(String::new(), 0);
    Ok((jar.add(cleared), StatusCode::NO_CONTENT))
}

/// Register a customer account
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    operation_id = "postAuthRegister",
    request_body = RegisterCustomerAccountCommand,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AuthApiState>,
    Json(command): Json<RegisterCustomerAccountCommand>,
) -> Result<(StatusCode, Json<RegisterResponse>), PlatformError> {
    let event = state.mediator.send(command, ExecutionContext::system()).await.into_result()?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: event.user_id,
            customer_id: event.customer_id,
        }),
    ))
}

/// Change own password
#[utoipa::path(
    post,
    path = "/password",
    tag = "auth",
    operation_id = "postAuthPassword",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or weak new password")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AuthApiState>,
    auth: Authenticated,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, PlatformError> {
    let command = ChangePasswordCommand {
        user_id: auth.principal_id.clone(),
        current_password: req.current_password,
        new_password: req.new_password,
    };
    state.mediator.send(command, auth.execution_context()).await.into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current caller
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    operation_id = "getAuthMe",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_current_user(auth: Authenticated) -> Json<CurrentUserResponse> {
    let mut permissions: Vec<String> = auth.permissions.iter().cloned().collect();
    permissions.sort();
    Json(CurrentUserResponse {
        id: auth.principal_id.clone(),
        email: auth.email.clone(),
        name: auth.name.clone(),
        role: auth.role,
        customer_id: auth.customer_id.clone(),
        permissions,
    })
}

pub fn auth_router(state: AuthApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(refresh))
        .routes(routes!(logout))
        .routes(routes!(register))
        .routes(routes!(change_password))
        .routes(routes!(get_current_user))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_deserialization() {
        let req: LoginRequest = serde_json::from_str(r#"{"email":"a@b.co","password":"secret"}"#).unwrap();
        assert_eq!(req.email, "a@b.co");
        assert_eq!(req.password, "secret");
    }

    #[test]
    fn test_token_response_serialization() {
        let response = TokenResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            token_type: "Bearer".into(),
            expires_in: 3600,
            user: SessionUser {
                id: "U1".into(),
                email: "a@b.co".into(),
                display_name: "A".into(),
                role: UserRole::Customer,
                customer_id: Some("C1".into()),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["user"]["role"], "CUSTOMER");
        assert_eq!(json["user"]["customerId"], "C1");
    }
}
