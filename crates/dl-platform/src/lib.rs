//! Dealerline Platform
//!
//! Dealership backend providing:
//! - Vehicle inventory and the public showroom
//! - Customers, sales orders, invoices and payments
//! - Purchase orders, service orders and appointments
//! - Waiting list for vehicles not in stock
//! - Staff and customer accounts with JWT sessions
//! - Use Case pattern with guaranteed audit logging, dispatched through a
//!   CQRS mediator
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `operations` - Use cases (commands)
//! - `queries` - Read-side handlers
//! - `api` - REST endpoints

// Inventory and showroom
pub mod vehicle;
pub mod purchase_order;
pub mod waiting_list;

// Sales
pub mod customer;
pub mod sales_order;
pub mod invoice;
pub mod payment;

// Workshop
pub mod service_order;
pub mod appointment;

// Accounts and access
pub mod user;
pub mod auth;
pub mod profile;

// Reporting
pub mod audit;
pub mod dashboard;

// Shared infrastructure
pub mod shared;
pub mod store;
pub mod mediator;

// Cross-cutting concerns
pub mod usecase;
pub mod platform;
pub mod seed;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export common types from shared
pub use shared::error::{PlatformError, Result};
pub use shared::tsid::TsidGenerator;

// Re-export use case infrastructure
pub use usecase::{
    DomainEvent, ExecutionContext, InMemoryUnitOfWork, MongoUnitOfWork, UnitOfWork, UseCaseError, UseCaseResult,
};
pub use mediator::{Command, CommandHandler, Mediator, Query, QueryHandler};
// Note: impl_domain_event!, impl_command_handler!, try_use_case! and details!
// are exported at the crate root via #[macro_export]

// Re-export persistence
pub use store::{DocumentStore, FindOptions, InMemoryStore, MongoStore, Page, TypedCollection};

// Re-export main entity types for convenience
pub use appointment::entity::{Appointment, AppointmentKind, AppointmentStatus};
pub use audit::entity::{AuditLog, StoredEvent};
pub use customer::entity::{Address, Customer, CustomerNote};
pub use invoice::entity::{Invoice, InvoiceLine, InvoiceSource, InvoiceStatus};
pub use payment::entity::{Payment, PaymentMethod, PaymentStatus};
pub use purchase_order::entity::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
pub use sales_order::entity::{SalesOrder, SalesOrderStatus};
pub use service_order::entity::{ServiceOrder, ServiceOrderStatus, ServiceTask};
pub use user::entity::{User, UserRole};
pub use vehicle::entity::{Vehicle, VehicleCondition, VehicleStatus};
pub use waiting_list::entity::{WaitingListEntry, WaitingListStatus};

// Re-export repositories
pub use appointment::repository::AppointmentRepository;
pub use audit::repository::{AuditLogRepository, EventRepository};
pub use auth::refresh_token_repository::RefreshTokenRepository;
pub use customer::repository::CustomerRepository;
pub use invoice::repository::InvoiceRepository;
pub use payment::repository::PaymentRepository;
pub use purchase_order::repository::PurchaseOrderRepository;
pub use sales_order::repository::SalesOrderRepository;
pub use service_order::repository::ServiceOrderRepository;
pub use user::repository::UserRepository;
pub use vehicle::repository::VehicleRepository;
pub use waiting_list::repository::WaitingListRepository;

// Re-export services and wiring
pub use auth::{AuthConfig, AuthService, PasswordService, SessionService};
pub use platform::{Platform, PlatformSettings, Repositories};
pub use seed::{Bootstrapper, BootstrapReport};
