//! Startup provisioning
//!
//! Creates the first admin account and, for demos, a small showroom
//! inventory. Both steps are idempotent: they skip work that already exists,
//! so the server can run them on every start.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::PasswordService;
use crate::shared::error::{PlatformError, Result};
use crate::user::{User, UserRepository, UserRole};
use crate::vehicle::{Vehicle, VehicleCondition, VehicleFilter, VehicleRepository};

/// (vin, make, model, year, condition, price in cents, mileage, color)
const DEMO_INVENTORY: &[(&str, &str, &str, i32, VehicleCondition, i64, i64, &str)] = &[
    ("1HGCM82633A004352", "Honda", "Accord", 2022, VehicleCondition::Used, 2_450_000, 18_200, "Silver"),
    ("2T1BURHE0JC074587", "Toyota", "Corolla", 2023, VehicleCondition::CertifiedPreOwned, 2_190_000, 9_800, "White"),
    ("5YJ3E1EA7KF317000", "Tesla", "Model 3", 2024, VehicleCondition::Used, 3_600_000, 12_400, "Blue"),
    ("WBA8E9G50GNU12345", "BMW", "330i", 2021, VehicleCondition::Used, 2_890_000, 31_000, "Black"),
    ("1FTEW1EP5MKD12345", "Ford", "F-150", 2025, VehicleCondition::New, 5_240_000, 12, "Red"),
];

/// What a bootstrap run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub admin_created: bool,
    pub vehicles_seeded: usize,
}

pub struct Bootstrapper {
    users: Arc<UserRepository>,
    vehicles: Arc<VehicleRepository>,
    passwords: Arc<PasswordService>,
}

impl Bootstrapper {
    pub fn new(users: Arc<UserRepository>, vehicles: Arc<VehicleRepository>, passwords: Arc<PasswordService>) -> Self {
        Self {
            users,
            vehicles,
            passwords,
        }
    }

    /// Create the admin account unless a user with that email exists.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(PlatformError::validation("Bootstrap admin email is empty"));
        }
        if let Some(existing) = self.users.find_by_email(&email).await? {
            if existing.role != UserRole::Admin || !existing.active {
                warn!(email = %email, role = existing.role.as_str(), "Bootstrap admin email belongs to a non-admin or inactive user");
            }
            return Ok(false);
        }

        self.passwords.validate_password(password)?;
        let hash = self.passwords.hash_password(password)?;
        let admin = User::new(email.as_str(), "Administrator", hash, UserRole::Admin);
        self.users.save(&admin).await?;
        info!(email = %email, user_id = %admin.id, "Created bootstrap admin");
        Ok(true)
    }

    /// Stock the showroom with demo vehicles when inventory is empty.
    pub async fn seed_demo_inventory(&self) -> Result<usize> {
        let existing = self.vehicles.search(&VehicleFilter::default(), 0, 1).await?;
        if existing.total > 0 {
            info!(vehicles = existing.total, "Inventory not empty, skipping demo seed");
            return Ok(0);
        }

        for &(vin, make, model, year, condition, price_cents, mileage, color) in DEMO_INVENTORY {
            let mut vehicle = Vehicle::new(vin, make, model, year, condition, price_cents);
            vehicle.mileage = mileage;
            vehicle.color = Some(color.to_string());
            self.vehicles.insert(&vehicle).await?;
        }
        info!(vehicles = DEMO_INVENTORY.len(), "Seeded demo inventory");
        Ok(DEMO_INVENTORY.len())
    }

    pub async fn run(&self, admin: Option<(&str, &str)>, seed_demo_data: bool) -> Result<BootstrapReport> {
        let mut report = BootstrapReport::default();
        if let Some((email, password)) = admin {
            report.admin_created = self.ensure_admin(email, password).await?;
        }
        if seed_demo_data {
            report.vehicles_seeded = self.seed_demo_inventory().await?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Argon2Config, PasswordPolicy};
    use crate::store::{DocumentStore, InMemoryStore};

    fn bootstrapper() -> (Bootstrapper, Arc<UserRepository>) {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let users = Arc::new(UserRepository::new(store.clone()));
        let passwords = Arc::new(PasswordService::new(Argon2Config::testing(), PasswordPolicy::default()).unwrap());
        let seeder = Bootstrapper::new(users.clone(), Arc::new(VehicleRepository::new(store)), passwords);
        (seeder, users)
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (seeder, users) = bootstrapper();

        let first = seeder.run(Some(("Admin@Dealer.test", "changeme123")), true).await.unwrap();
        assert!(first.admin_created);
        assert_eq!(first.vehicles_seeded, DEMO_INVENTORY.len());

        let second = seeder.run(Some(("admin@dealer.test", "changeme123")), true).await.unwrap();
        assert_eq!(second, BootstrapReport::default());

        let admin = users.find_by_email("admin@dealer.test").await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(admin.active);
    }

    #[tokio::test]
    async fn test_weak_admin_password_rejected() {
        let (seeder, _) = bootstrapper();
        assert!(seeder.ensure_admin("admin@dealer.test", "short").await.is_err());
    }
}
