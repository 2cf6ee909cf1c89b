//! Self-service endpoints for the customer linked to the caller.
//!
//! Every handler resolves the caller's customer id first and scopes reads
//! and writes to it; records of other customers are forbidden.

pub mod api;

pub use api::profile_router;
