//! Use Case Result Type
//!
//! Success can only be created inside this crate, and production code does
//! so only through a `UnitOfWork` commit. A successful command therefore
//! always has a persisted event and audit entry behind it.

use super::error::UseCaseError;

pub enum UseCaseResult<T> {
    /// Committed; carries the domain event (or a value derived from it).
    Success(T),
    Failure(UseCaseError),
}

impl<T> UseCaseResult<T> {
    /// Failures are public: any code may reject a command.
    pub fn failure(error: UseCaseError) -> Self {
        UseCaseResult::Failure(error)
    }

    pub(crate) fn success(value: T) -> Self {
        UseCaseResult::Success(value)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UseCaseResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, UseCaseResult::Failure(_))
    }

    /// Get the success value, consuming self.
    ///
    /// # Panics
    ///
    /// Panics on `Failure`. Intended for tests.
    pub fn unwrap(self) -> T {
        match self {
            UseCaseResult::Success(v) => v,
            UseCaseResult::Failure(e) => panic!("Called unwrap on a Failure: {}", e),
        }
    }

    /// Get the error, consuming self.
    ///
    /// # Panics
    ///
    /// Panics on `Success`. Intended for tests.
    pub fn unwrap_err(self) -> UseCaseError {
        match self {
            UseCaseResult::Success(_) => panic!("Called unwrap_err on a Success"),
            UseCaseResult::Failure(e) => e,
        }
    }

    pub fn error(&self) -> Option<&UseCaseError> {
        match self {
            UseCaseResult::Success(_) => None,
            UseCaseResult::Failure(e) => Some(e),
        }
    }

    pub fn map<U, F>(self, f: F) -> UseCaseResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            UseCaseResult::Success(v) => UseCaseResult::Success(f(v)),
            UseCaseResult::Failure(e) => UseCaseResult::Failure(e),
        }
    }

    pub fn into_result(self) -> Result<T, UseCaseError> {
        match self {
            UseCaseResult::Success(v) => Ok(v),
            UseCaseResult::Failure(e) => Err(e),
        }
    }
}

/// Early-return a `UseCaseResult::Failure` from an `Err`, like `?` does for
/// `Result`. Accepts any error convertible into `UseCaseError`.
#[macro_export]
macro_rules! try_use_case {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return $crate::usecase::UseCaseResult::failure(e.into()),
        }
    };
}

impl<T> From<UseCaseResult<T>> for Result<T, UseCaseError> {
    fn from(result: UseCaseResult<T>) -> Self {
        result.into_result()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for UseCaseResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UseCaseResult::Success(v) => f.debug_tuple("Success").field(v).finish(),
            UseCaseResult::Failure(e) => f.debug_tuple("Failure").field(e).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result: UseCaseResult<String> = UseCaseResult::success("test".to_string());
        assert!(result.is_success());
        assert!(result.error().is_none());
        assert_eq!(result.unwrap(), "test");
    }

    #[test]
    fn test_failure_result() {
        let result: UseCaseResult<String> =
            UseCaseResult::failure(UseCaseError::validation("CODE", "message"));
        assert!(result.is_failure());
        assert_eq!(result.error().map(|e| e.code()), Some("CODE"));
        assert_eq!(result.unwrap_err().code(), "CODE");
    }

    #[test]
    fn test_map_and_into_result() {
        let result: UseCaseResult<i32> = UseCaseResult::success(21);
        assert_eq!(result.map(|v| v * 2).into_result().unwrap(), 42);

        let failed: UseCaseResult<i32> = UseCaseResult::failure(UseCaseError::not_found("NF", "gone"));
        assert!(failed.map(|v| v + 1).into_result().is_err());
    }
}
