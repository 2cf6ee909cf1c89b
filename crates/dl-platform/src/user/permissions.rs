//! Permission strings and the static role grants.

use super::entity::UserRole;

pub const ALL: &str = "*:*";

pub const VEHICLES_READ: &str = "vehicles:read";
pub const VEHICLES_WRITE: &str = "vehicles:write";
pub const CUSTOMERS_READ: &str = "customers:read";
pub const CUSTOMERS_WRITE: &str = "customers:write";
pub const SALES_READ: &str = "sales:read";
pub const SALES_WRITE: &str = "sales:write";
pub const INVOICES_READ: &str = "invoices:read";
pub const INVOICES_WRITE: &str = "invoices:write";
pub const PAYMENTS_READ: &str = "payments:read";
pub const PAYMENTS_WRITE: &str = "payments:write";
pub const PURCHASING_READ: &str = "purchasing:read";
pub const PURCHASING_WRITE: &str = "purchasing:write";
pub const SERVICE_READ: &str = "service:read";
pub const SERVICE_WRITE: &str = "service:write";
pub const APPOINTMENTS_READ: &str = "appointments:read";
pub const APPOINTMENTS_WRITE: &str = "appointments:write";
pub const WAITLIST_READ: &str = "waitlist:read";
pub const WAITLIST_WRITE: &str = "waitlist:write";
pub const USERS_READ: &str = "users:read";
pub const USERS_WRITE: &str = "users:write";
pub const AUDIT_READ: &str = "audit:read";
pub const DASHBOARD_READ: &str = "dashboard:read";

const MANAGER: &[&str] = &[
    "vehicles:*",
    "customers:*",
    "sales:*",
    "invoices:*",
    "payments:*",
    "purchasing:*",
    "service:*",
    "appointments:*",
    "waitlist:*",
    USERS_READ,
    AUDIT_READ,
    DASHBOARD_READ,
];

const SALES: &[&str] = &[
    VEHICLES_READ,
    "customers:*",
    "sales:*",
    INVOICES_READ,
    "payments:*",
    "appointments:*",
    "waitlist:*",
    DASHBOARD_READ,
];

const SERVICE: &[&str] = &[
    VEHICLES_READ,
    CUSTOMERS_READ,
    "service:*",
    "appointments:*",
    INVOICES_READ,
];

pub fn role_permissions(role: UserRole) -> &'static [&'static str] {
    match role {
        UserRole::Admin => &[ALL],
        UserRole::Manager => MANAGER,
        UserRole::Sales => SALES,
        UserRole::Service => SERVICE,
        UserRole::Customer => &[],
    }
}
