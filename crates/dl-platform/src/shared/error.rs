//! Platform Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::shared::api_common::ApiError;
use crate::usecase::UseCaseError;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Duplicate entity: {entity_type} with {field}={value}")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authorization error: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    /// A command rejected by its use case; keeps the use case code and status.
    #[error("{0}")]
    UseCase(UseCaseError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PlatformError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlatformError::Duplicate { .. } => StatusCode::CONFLICT,
            PlatformError::Validation { .. } => StatusCode::BAD_REQUEST,
            PlatformError::Unauthorized { .. }
            | PlatformError::InvalidCredentials
            | PlatformError::TokenExpired
            | PlatformError::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            PlatformError::Forbidden { .. } | PlatformError::AccountDisabled => StatusCode::FORBIDDEN,
            PlatformError::UseCase(e) => {
                StatusCode::from_u16(e.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &str {
        match self {
            PlatformError::NotFound { .. } => "NOT_FOUND",
            PlatformError::Duplicate { .. } => "DUPLICATE",
            PlatformError::Validation { .. } => "VALIDATION_ERROR",
            PlatformError::Unauthorized { .. } => "UNAUTHORIZED",
            PlatformError::Forbidden { .. } => "FORBIDDEN",
            PlatformError::InvalidCredentials => "INVALID_CREDENTIALS",
            PlatformError::AccountDisabled => "ACCOUNT_DISABLED",
            PlatformError::TokenExpired => "TOKEN_EXPIRED",
            PlatformError::InvalidToken { .. } => "INVALID_TOKEN",
            PlatformError::UseCase(e) => e.code(),
            _ => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = match &self {
            PlatformError::UseCase(e) => ApiError {
                error: e.code().to_string(),
                message: e.message().to_string(),
                details: if e.details().is_empty() {
                    None
                } else {
                    serde_json::to_value(e.details()).ok()
                },
            },
            // Driver errors can leak connection details
            PlatformError::Database(_) => ApiError {
                error: self.code().to_string(),
                message: "Database error".to_string(),
                details: None,
            },
            _ => ApiError {
                error: self.code().to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<UseCaseError> for PlatformError {
    fn from(err: UseCaseError) -> Self {
        PlatformError::UseCase(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PlatformError::not_found("Vehicle", "V1").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(PlatformError::duplicate("Customer", "email", "a@b.c").status_code(), StatusCode::CONFLICT);
        assert_eq!(PlatformError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(PlatformError::AccountDisabled.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(PlatformError::internal("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_use_case_error_keeps_code_and_status() {
        let err: PlatformError =
            UseCaseError::business_rule("VEHICLE_NOT_AVAILABLE", "Vehicle is reserved").into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "VEHICLE_NOT_AVAILABLE");

        let err: PlatformError = UseCaseError::validation("INVALID_VIN", "bad vin").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
