//! Authorization
//!
//! Permission-based access control. Permissions are `resource:action`
//! strings resolved statically from the caller's role.

use std::collections::HashSet;

use crate::auth::auth_service::AccessTokenClaims;
use crate::shared::error::{PlatformError, Result};
use crate::user::permissions::{self, role_permissions};
use crate::user::UserRole;

/// Authorization context for a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal_id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,

    /// Customer record linked to a `CUSTOMER` account
    pub customer_id: Option<String>,

    pub permissions: HashSet<String>,
}

impl AuthContext {
    pub fn from_claims(claims: &AccessTokenClaims) -> Result<Self> {
        let role: UserRole = claims
            .role
            .parse()
            .map_err(|_| PlatformError::InvalidToken { message: format!("Unknown role {}", claims.role) })?;
        Ok(Self {
            principal_id: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone(),
            role,
            customer_id: claims.customer_id.clone(),
            permissions: role_permissions(role).iter().map(|p| p.to_string()).collect(),
        })
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        if self.permissions.contains(permission) || self.permissions.contains(permissions::ALL) {
            return true;
        }
        match permission.split_once(':') {
            Some((resource, _)) => self.permissions.contains(&format!("{}:*", resource)),
            None => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role != UserRole::Customer
    }
}

pub mod checks {
    use super::*;

    pub fn require(context: &AuthContext, permission: &str) -> Result<()> {
        if context.has_permission(permission) {
            Ok(())
        } else {
            Err(PlatformError::forbidden(format!("Missing permission {}", permission)))
        }
    }

    pub fn require_admin(context: &AuthContext) -> Result<()> {
        if context.is_admin() {
            Ok(())
        } else {
            Err(PlatformError::forbidden("Admin access required"))
        }
    }

    /// The customer linked to the caller; fails for staff and unlinked accounts.
    pub fn require_customer(context: &AuthContext) -> Result<&str> {
        context
            .customer_id
            .as_deref()
            .ok_or_else(|| PlatformError::forbidden("No customer profile linked to this account"))
    }

    /// Records owned by another customer are forbidden.
    pub fn require_owner(context: &AuthContext, owner_customer_id: &str) -> Result<()> {
        if require_customer(context)? == owner_customer_id {
            Ok(())
        } else {
            Err(PlatformError::forbidden("Record belongs to another customer"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: UserRole, customer_id: Option<&str>) -> AuthContext {
        AuthContext {
            principal_id: "U1".into(),
            email: "x@dealer.test".into(),
            name: "X".into(),
            role,
            customer_id: customer_id.map(String::from),
            permissions: role_permissions(role).iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_admin_has_everything() {
        let ctx = context(UserRole::Admin, None);
        assert!(ctx.has_permission(permissions::USERS_WRITE));
        assert!(ctx.has_permission(permissions::AUDIT_READ));
        assert!(checks::require_admin(&ctx).is_ok());
    }

    #[test]
    fn test_resource_wildcard() {
        let ctx = context(UserRole::Sales, None);
        assert!(ctx.has_permission(permissions::SALES_WRITE));
        assert!(ctx.has_permission(permissions::CUSTOMERS_WRITE));
        assert!(ctx.has_permission(permissions::VEHICLES_READ));
        assert!(!ctx.has_permission(permissions::VEHICLES_WRITE));
        assert!(!ctx.has_permission(permissions::USERS_READ));
        assert!(checks::require(&ctx, permissions::PURCHASING_WRITE).is_err());
    }

    #[test]
    fn test_customer_ownership() {
        let ctx = context(UserRole::Customer, Some("C1"));
        assert!(!ctx.has_permission(permissions::VEHICLES_READ));
        assert!(checks::require_owner(&ctx, "C1").is_ok());
        assert!(matches!(
            checks::require_owner(&ctx, "C2"),
            Err(PlatformError::Forbidden { .. })
        ));

        let staff = context(UserRole::Manager, None);
        assert!(checks::require_customer(&staff).is_err());
    }
}
