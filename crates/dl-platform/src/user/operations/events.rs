//! User Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::user::entity::{User, UserRole};
use crate::usecase::{EventMetadata, ExecutionContext};

const DOMAIN: &str = "iam";
const AGGREGATE: &str = "user";

fn metadata(ctx: &ExecutionContext, action: &str, user_id: &str) -> EventMetadata {
    EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, action, user_id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

impl_domain_event!(UserCreated);

impl UserCreated {
    pub fn new(ctx: &ExecutionContext, user: &User) -> Self {
        Self {
            metadata: metadata(ctx, "created", &user.id),
            user_id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub user_id: String,
    pub display_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_role: Option<UserRole>,
}

impl_domain_event!(UserUpdated);

impl UserUpdated {
    pub fn new(ctx: &ExecutionContext, user: &User, previous_role: Option<UserRole>) -> Self {
        Self {
            metadata: metadata(ctx, "updated", &user.id),
            user_id: user.id.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            previous_role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPasswordChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub user_id: String,
}

impl_domain_event!(UserPasswordChanged);

impl UserPasswordChanged {
    pub fn new(ctx: &ExecutionContext, user: &User) -> Self {
        Self {
            metadata: metadata(ctx, "password-changed", &user.id),
            user_id: user.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeactivated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl_domain_event!(UserDeactivated);

impl UserDeactivated {
    pub fn new(ctx: &ExecutionContext, user: &User, reason: Option<&str>) -> Self {
        Self {
            metadata: metadata(ctx, "deactivated", &user.id),
            user_id: user.id.clone(),
            reason: reason.map(String::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub user_id: String,
}

impl_domain_event!(UserActivated);

impl UserActivated {
    pub fn new(ctx: &ExecutionContext, user: &User) -> Self {
        Self {
            metadata: metadata(ctx, "activated", &user.id),
            user_id: user.id.clone(),
        }
    }
}

/// A customer signed up for self-service access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAccountRegistered {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub user_id: String,
    pub customer_id: String,
    pub email: String,
    /// Whether an existing customer record was linked rather than created
    pub linked_existing_customer: bool,
}

impl_domain_event!(CustomerAccountRegistered);

impl CustomerAccountRegistered {
    pub fn new(ctx: &ExecutionContext, user: &User, customer_id: &str, linked_existing_customer: bool) -> Self {
        Self {
            metadata: metadata(ctx, "customer-registered", &user.id),
            user_id: user.id.clone(),
            customer_id: customer_id.to_string(),
            email: user.email.clone(),
            linked_existing_customer,
        }
    }
}
