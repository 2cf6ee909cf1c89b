//! User Entity
//!
//! Staff accounts and customer self-service accounts.

use std::fmt;
use std::str::FromStr;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::HasId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    Sales,
    Service,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Manager => "MANAGER",
            UserRole::Sales => "SALES",
            UserRole::Service => "SERVICE",
            UserRole::Customer => "CUSTOMER",
        }
    }

    pub fn is_staff(&self) -> bool {
        *self != UserRole::Customer
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "MANAGER" => Ok(UserRole::Manager),
            "SALES" => Ok(UserRole::Sales),
            "SERVICE" => Ok(UserRole::Service),
            "CUSTOMER" => Ok(UserRole::Customer),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    /// Lowercased, unique
    pub email: String,

    pub display_name: String,

    /// Argon2id PHC string
    pub password_hash: String,

    pub role: UserRole,

    pub active: bool,

    /// Linked customer record for `CUSTOMER` accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub last_login_at: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            version: 0,
            email: email.into().trim().to_lowercase(),
            display_name: display_name.into(),
            password_hash: password_hash.into(),
            role,
            active: true,
            customer_id: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "users"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("sales".parse::<UserRole>().unwrap(), UserRole::Sales);
        assert_eq!(UserRole::Manager.to_string(), "MANAGER");
        assert!("OWNER".parse::<UserRole>().is_err());
        assert!(!UserRole::Customer.is_staff());
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new("  Ana@Dealer.TEST ", "Ana", "hash", UserRole::Sales);
        assert_eq!(user.email, "ana@dealer.test");
        assert!(user.active);
        assert_eq!(User::collection_name(), "users");
    }
}
