//! Use Case Errors
//!
//! Categorized error types for use case failures. The category decides the
//! HTTP status; the code is a stable machine-readable identifier.
//!
//! ```ignore
//! UseCaseError::validation("VIN_REQUIRED", "VIN is required");
//!
//! UseCaseError::business_rule_with_details(
//!     "VEHICLE_NOT_AVAILABLE",
//!     "Vehicle is already reserved",
//!     details!{ "vehicleId" => vehicle_id, "status" => "RESERVED" },
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::error::PlatformError;

/// Build an error detail map.
#[macro_export]
macro_rules! details {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), serde_json::json!($value));
        )+
        map
    }};
}

/// Categorized error types for use case failures.
///
/// - `ValidationError` -> 400 Bad Request
/// - `BusinessRuleViolation` -> 409 Conflict
/// - `NotFoundError` -> 404 Not Found
/// - `ConcurrencyError` -> 409 Conflict
/// - `CommitError` -> 500 Internal Server Error
/// - `InternalError` -> 500 Internal Server Error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UseCaseError {
    ValidationError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Entity in the wrong state, uniqueness or cross-aggregate constraint.
    BusinessRuleViolation {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    NotFoundError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    ConcurrencyError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Transaction commit failed.
    CommitError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Infrastructure failure outside a commit (repository read, missing handler).
    InternalError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },
}

impl UseCaseError {
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn validation_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn business_rule(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn business_rule_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::BusinessRuleViolation {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFoundError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn concurrency(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConcurrencyError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn commit(message: impl Into<String>) -> Self {
        Self::CommitError {
            code: "COMMIT_FAILED".to_string(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InternalError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::ValidationError { code, .. }
            | Self::BusinessRuleViolation { code, .. }
            | Self::NotFoundError { code, .. }
            | Self::ConcurrencyError { code, .. }
            | Self::CommitError { code, .. }
            | Self::InternalError { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ValidationError { message, .. }
            | Self::BusinessRuleViolation { message, .. }
            | Self::NotFoundError { message, .. }
            | Self::ConcurrencyError { message, .. }
            | Self::CommitError { message, .. }
            | Self::InternalError { message, .. } => message,
        }
    }

    pub fn details(&self) -> &HashMap<String, serde_json::Value> {
        match self {
            Self::ValidationError { details, .. }
            | Self::BusinessRuleViolation { details, .. }
            | Self::NotFoundError { details, .. }
            | Self::ConcurrencyError { details, .. }
            | Self::CommitError { details, .. }
            | Self::InternalError { details, .. } => details,
        }
    }

    /// Get the suggested HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ValidationError { .. } => 400,
            Self::BusinessRuleViolation { .. } => 409,
            Self::NotFoundError { .. } => 404,
            Self::ConcurrencyError { .. } => 409,
            Self::CommitError { .. } | Self::InternalError { .. } => 500,
        }
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for UseCaseError {}

impl From<PlatformError> for UseCaseError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::UseCase(inner) => inner,
            PlatformError::NotFound { entity_type, id } => Self::not_found(
                "NOT_FOUND",
                format!("{} {} not found", entity_type, id),
            ),
            PlatformError::Duplicate { entity_type, field, value } => Self::business_rule(
                "DUPLICATE",
                format!("{} with {}={} already exists", entity_type, field, value),
            ),
            PlatformError::Validation { message } => Self::validation("INVALID_INPUT", message),
            other => Self::internal("REPOSITORY_ERROR", other.to_string()),
        }
    }
}

impl From<dl_common::money::MoneyError> for UseCaseError {
    fn from(err: dl_common::money::MoneyError) -> Self {
        use dl_common::money::MoneyError;
        match err {
            MoneyError::Negative(_) => Self::validation("NEGATIVE_AMOUNT", err.to_string()),
            MoneyError::Overflow => Self::validation("AMOUNT_OVERFLOW", err.to_string()),
            MoneyError::RateTooHigh(_) => Self::validation("INVALID_TAX_RATE", err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = UseCaseError::validation("VIN_REQUIRED", "VIN is required");
        assert_eq!(err.code(), "VIN_REQUIRED");
        assert_eq!(err.message(), "VIN is required");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(UseCaseError::not_found("X", "x").http_status_code(), 404);
        assert_eq!(UseCaseError::business_rule("X", "x").http_status_code(), 409);
        assert_eq!(UseCaseError::concurrency("X", "x").http_status_code(), 409);
        assert_eq!(UseCaseError::commit("x").http_status_code(), 500);
        assert_eq!(UseCaseError::internal("X", "x").http_status_code(), 500);
    }

    #[test]
    fn test_details_macro() {
        let empty: HashMap<String, serde_json::Value> = details!();
        assert!(empty.is_empty());

        let err = UseCaseError::business_rule_with_details(
            "VEHICLE_NOT_AVAILABLE",
            "Vehicle is reserved",
            details! { "vehicleId" => "V1", "status" => "RESERVED", "attempts" => 2 },
        );
        assert_eq!(err.details().get("vehicleId"), Some(&serde_json::json!("V1")));
        assert_eq!(err.details().get("attempts"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn test_from_platform_error_unwraps_use_case() {
        let inner = UseCaseError::business_rule("INVOICE_VOID", "Invoice is void");
        let err: UseCaseError = PlatformError::UseCase(inner).into();
        assert_eq!(err.code(), "INVOICE_VOID");

        let err: UseCaseError = PlatformError::internal("disk on fire").into();
        assert_eq!(err.code(), "REPOSITORY_ERROR");
        assert_eq!(err.http_status_code(), 500);
    }
}
