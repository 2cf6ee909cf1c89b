//! Dealerline API Client
//!
//! Typed access to the showroom and the customer self-service endpoints,
//! with a bearer-token interceptor that refreshes expired sessions.
//!
//! ```no_run
//! use dl_client::{Client, ClientConfig, PageRequest};
//!
//! # async fn run() -> dl_client::Result<()> {
//! let client = Client::new(ClientConfig::new("http://localhost:8080/api"))?;
//! client.login("ada@example.com", "secret-password").await?;
//! let invoices = client.my_invoices(PageRequest::new(0, 20)).await?;
//! println!("{} open invoices", invoices.total);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
mod session;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::{
    Appointment, BookAppointment, BookableKind, Invoice, InvoiceLine, Page, PageRequest, PayInvoice, PaymentReceipt,
    Profile, SessionUser, ShowroomSearch, ShowroomVehicle, TokenResponse,
};
pub use session::SessionSnapshot;
