//! Shared infrastructure: errors, ids, API plumbing and access control.

pub mod api_common;
pub mod authorization;
pub mod error;
pub mod health_api;
pub mod middleware;
pub mod tsid;
pub mod validation;

pub use api_common::{CreatedResponse, MediatorState, PaginatedResponse, PaginationParams, SuccessResponse};
pub use authorization::{checks, AuthContext};
pub use error::{PlatformError, Result};
pub use middleware::{AppState, AuthLayer, Authenticated, OptionalAuth};
pub use tsid::TsidGenerator;
