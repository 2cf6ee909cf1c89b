//! Dealerline Common
//!
//! Pieces shared by the server, the platform library and the API client.

pub mod logging;
pub mod money;

pub use logging::init_logging;
pub use money::{apply_rate, format_cents, Totals};
