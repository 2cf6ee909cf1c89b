//! Create User Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::UserCreated;
use super::password::hash_new_password;
use crate::auth::password_service::PasswordService;
use crate::mediator::Command;
use crate::shared::validation::{normalize_email, required};
use crate::try_use_case;
use crate::user::entity::{User, UserRole};
use crate::user::repository::UserRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

/// Create a staff account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserCommand {
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
}

impl Command for CreateUserCommand {
    type Output = UserCreated;
}

pub struct CreateUserUseCase<U: UnitOfWork> {
    users: Arc<UserRepository>,
    passwords: Arc<PasswordService>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CreateUserUseCase<U> {
    pub fn new(users: Arc<UserRepository>, passwords: Arc<PasswordService>, unit_of_work: Arc<U>) -> Self {
        Self {
            users,
            passwords,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: CreateUserCommand, ctx: ExecutionContext) -> UseCaseResult<UserCreated> {
        let email = try_use_case!(normalize_email(&command.email));
        let display_name = try_use_case!(required(&command.display_name, "DISPLAY_NAME_REQUIRED", "Display name"));

        // Customer accounts come from self-registration so they get a customer record
        if !command.role.is_staff() {
            return UseCaseResult::failure(UseCaseError::validation(
                "STAFF_ROLE_REQUIRED",
                "Customer accounts are created through registration",
            ));
        }

        if try_use_case!(self.users.exists_by_email(&email).await) {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "EMAIL_TAKEN",
                format!("A user with email '{}' already exists", email),
            ));
        }

        let hash = try_use_case!(hash_new_password(&self.passwords, &command.password));
        let user = User::new(email, display_name, hash, command.role);

        let event = UserCreated::new(&ctx, &user);
        self.unit_of_work.commit(&user, event, &command).await
    }
}

crate::impl_command_handler!(CreateUserUseCase, CreateUserCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password_service::{Argon2Config, PasswordPolicy};
    use crate::test_support::{ctx, Memory};

    fn command(email: &str, role: UserRole) -> CreateUserCommand {
        CreateUserCommand {
            email: email.into(),
            display_name: "Sam Seller".into(),
            password: "password-1".into(),
            role,
        }
    }

    fn use_case(mem: &Memory) -> (CreateUserUseCase<crate::usecase::InMemoryUnitOfWork>, Arc<UserRepository>) {
        let users = Arc::new(UserRepository::new(mem.dyn_store()));
        let passwords = Arc::new(PasswordService::new(Argon2Config::testing(), PasswordPolicy::default()).unwrap());
        (CreateUserUseCase::new(users.clone(), passwords, mem.uow.clone()), users)
    }

    #[tokio::test]
    async fn test_create_staff_user() {
        let mem = Memory::new();
        let (uc, users) = use_case(&mem);

        let event = uc.execute(command("Sam@Dealer.test", UserRole::Sales), ctx()).await.unwrap();
        assert_eq!(event.email, "sam@dealer.test");

        let stored = users.find_by_id(&event.user_id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "password-1");
        assert_eq!(mem.event_count("user:created").await, 1);
    }

    #[tokio::test]
    async fn test_rejects_duplicates_and_customer_role() {
        let mem = Memory::new();
        let (uc, _) = use_case(&mem);
        uc.execute(command("sam@dealer.test", UserRole::Sales), ctx()).await.unwrap();

        let dup = uc.execute(command("SAM@dealer.test", UserRole::Service), ctx()).await;
        assert_eq!(dup.unwrap_err().code(), "EMAIL_TAKEN");

        let customer = uc.execute(command("c@dealer.test", UserRole::Customer), ctx()).await;
        assert_eq!(customer.unwrap_err().code(), "STAFF_ROLE_REQUIRED");

        let mut weak = command("w@dealer.test", UserRole::Sales);
        weak.password = "short".into();
        assert_eq!(uc.execute(weak, ctx()).await.unwrap_err().code(), "WEAK_PASSWORD");
    }

    #[test]
    fn test_password_not_serialized() {
        let json = serde_json::to_string(&command("a@b.co", UserRole::Sales)).unwrap();
        assert!(!json.contains("password-1"));
    }
}
