//! Input validation helpers shared by use cases.

use std::sync::OnceLock;

use regex::Regex;

use crate::usecase::UseCaseError;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Trimmed, lowercased email or `INVALID_EMAIL`.
pub fn normalize_email(email: &str) -> Result<String, UseCaseError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(UseCaseError::validation("INVALID_EMAIL", format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}

/// Trimmed value, or a validation error with `code` when blank.
pub fn required(value: &str, code: &str, field: &str) -> Result<String, UseCaseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UseCaseError::validation(code, format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// `None` for absent or blank values.
pub fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

pub fn max_length(value: &str, max: usize, code: &str, field: &str) -> Result<(), UseCaseError> {
    if value.chars().count() > max {
        return Err(UseCaseError::validation(code, format!("{} must be at most {} characters", field, max)));
    }
    Ok(())
}

/// `INVALID_STATUS_TRANSITION` for a lifecycle move the status machine forbids.
pub fn invalid_transition(entity: &str, from: &str, to: &str) -> UseCaseError {
    UseCaseError::business_rule_with_details(
        "INVALID_STATUS_TRANSITION",
        format!("{} cannot move from {} to {}", entity, from, to),
        crate::details! { "from" => from, "to" => to },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jo@Example.COM ").unwrap(), "jo@example.com");
        assert_eq!(normalize_email("not-an-email").unwrap_err().code(), "INVALID_EMAIL");
        assert!(normalize_email("a@b").is_err());
    }

    #[test]
    fn test_required_and_optional() {
        assert_eq!(required("  Corolla ", "MODEL_REQUIRED", "Model").unwrap(), "Corolla");
        assert_eq!(required("   ", "MODEL_REQUIRED", "Model").unwrap_err().code(), "MODEL_REQUIRED");
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" x ")), Some("x".to_string()));
        assert!(max_length("abcd", 3, "TOO_LONG", "Note").is_err());
    }

    #[test]
    fn test_invalid_transition_details() {
        let err = invalid_transition("Sales order", "COMPLETED", "CANCELLED");
        assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");
        assert_eq!(err.details()["from"], "COMPLETED");
    }
}
