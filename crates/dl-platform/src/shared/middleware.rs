//! API Middleware
//!
//! Authentication extractors for Axum. A token is read from the
//! `Authorization: Bearer` header first, then from the session cookie.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use tower::{Layer, Service};

use crate::auth::auth_service::{extract_bearer_token, AuthService};
use crate::shared::api_common::ApiError;
use crate::shared::authorization::AuthContext;
use crate::shared::tsid::TsidGenerator;
use crate::usecase::ExecutionContext;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Services the extractors need, injected per request by `AuthLayer`.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub session_cookie_name: String,
}

/// Correlation id of the current request, from `X-Correlation-ID` or fresh.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

/// Authenticated caller.
pub struct Authenticated {
    pub context: AuthContext,
    pub correlation_id: String,
}

impl Authenticated {
    /// Execution context for commands issued on behalf of this caller.
    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::with_correlation(&self.context.principal_id, &self.correlation_id)
    }
}

impl std::ops::Deref for Authenticated {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

pub struct AuthError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ApiError {
            error: "UNAUTHORIZED".to_string(),
            message: self.message,
            details: None,
        };
        (self.status, Json(body)).into_response()
    }
}

fn extract_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .map(String::from)
        .or_else(|| {
            CookieJar::from_headers(&parts.headers)
                .get(cookie_name)
                .map(|c| c.value().to_string())
        })
}

fn correlation_id(parts: &Parts) -> String {
    parts
        .extensions
        .get::<CorrelationId>()
        .map(|c| c.0.clone())
        .unwrap_or_else(|| format!("corr-{}", TsidGenerator::generate()))
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts.extensions.get::<AppState>().ok_or_else(|| AuthError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Auth service not configured".to_string(),
        })?;

        let token = extract_token(parts, &app_state.session_cookie_name).ok_or_else(|| AuthError {
            status: StatusCode::UNAUTHORIZED,
            message: "Missing authentication token".to_string(),
        })?;

        let context = app_state
            .auth_service
            .validate_token(&token)
            .and_then(|claims| AuthContext::from_claims(&claims))
            .map_err(|e| AuthError {
                status: StatusCode::UNAUTHORIZED,
                message: e.to_string(),
            })?;

        Ok(Authenticated {
            context,
            correlation_id: correlation_id(parts),
        })
    }
}

/// Optional authentication; never rejects.
pub struct OptionalAuth(pub Option<AuthContext>);

impl std::ops::Deref for OptionalAuth {
    type Target = Option<AuthContext>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(app_state) = parts.extensions.get::<AppState>() else {
            return Ok(OptionalAuth(None));
        };
        let Some(token) = extract_token(parts, &app_state.session_cookie_name) else {
            return Ok(OptionalAuth(None));
        };
        let context = app_state
            .auth_service
            .validate_token(&token)
            .and_then(|claims| AuthContext::from_claims(&claims))
            .ok();
        Ok(OptionalAuth(context))
    }
}

/// Injects `AppState` and a `CorrelationId` into request extensions and
/// echoes the correlation id on the response.
#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let correlation = req
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty() && v.len() <= 128)
            .map(String::from)
            .unwrap_or_else(|| format!("corr-{}", TsidGenerator::generate()));

        req.extensions_mut().insert(self.state.clone());
        req.extensions_mut().insert(CorrelationId(correlation.clone()));

        let future = self.inner.call(req);
        Box::pin(async move {
            let mut response = future.await?;
            if let Ok(value) = HeaderValue::from_str(&correlation) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(CORRELATION_HEADER), value);
            }
            Ok(response)
        })
    }
}
