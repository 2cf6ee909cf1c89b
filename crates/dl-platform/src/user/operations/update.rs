//! Update User Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::events::UserUpdated;
use crate::mediator::Command;
use crate::shared::validation::required;
use crate::try_use_case;
use crate::user::entity::UserRole;
use crate::user::repository::UserRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserCommand {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl Command for UpdateUserCommand {
    type Output = UserUpdated;
}

pub struct UpdateUserUseCase<U: UnitOfWork> {
    users: Arc<UserRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> UpdateUserUseCase<U> {
    pub fn new(users: Arc<UserRepository>, unit_of_work: Arc<U>) -> Self {
        Self { users, unit_of_work }
    }

    pub async fn execute(&self, command: UpdateUserCommand, ctx: ExecutionContext) -> UseCaseResult<UserUpdated> {
        let Some(mut user) = try_use_case!(self.users.find_by_id(&command.user_id).await) else {
            return UseCaseResult::failure(UseCaseError::not_found(
                "USER_NOT_FOUND",
                format!("User '{}' not found", command.user_id),
            ));
        };

        if let Some(name) = &command.display_name {
            user.display_name = try_use_case!(required(name, "DISPLAY_NAME_REQUIRED", "Display name"));
        }

        let mut previous_role = None;
        if let Some(role) = command.role.filter(|r| *r != user.role) {
            // Customer accounts stay customers, staff stay staff
            if role.is_staff() != user.role.is_staff() {
                return UseCaseResult::failure(UseCaseError::business_rule(
                    "ROLE_CHANGE_NOT_ALLOWED",
                    "Cannot convert between customer and staff accounts",
                ));
            }
            if user.role == UserRole::Admin
                && user.active
                && try_use_case!(self.users.count_active_admins().await) <= 1
            {
                return UseCaseResult::failure(UseCaseError::business_rule(
                    "LAST_ADMIN",
                    "Cannot demote the last active administrator",
                ));
            }
            previous_role = Some(user.role);
            user.role = role;
        }

        user.touch();
        let event = UserUpdated::new(&ctx, &user, previous_role);
        self.unit_of_work.commit(&user, event, &command).await
    }
}

crate::impl_command_handler!(UpdateUserUseCase, UpdateUserCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, Memory};
    use crate::user::User;

    #[tokio::test]
    async fn test_last_admin_cannot_be_demoted() {
        let mem = Memory::new();
        let users = Arc::new(UserRepository::new(mem.dyn_store()));
        let admin = User::new("root@dealer.test", "Root", "hash", UserRole::Admin);
        users.save(&admin).await.unwrap();
        let uc = UpdateUserUseCase::new(users.clone(), mem.uow.clone());

        let demote = UpdateUserCommand {
            user_id: admin.id.clone(),
            display_name: None,
            role: Some(UserRole::Manager),
        };
        assert_eq!(uc.execute(demote.clone(), ctx()).await.unwrap_err().code(), "LAST_ADMIN");

        users.save(&User::new("second@dealer.test", "Second", "hash", UserRole::Admin)).await.unwrap();
        let event = uc.execute(demote, ctx()).await.unwrap();
        assert_eq!(event.role, UserRole::Manager);
        assert_eq!(event.previous_role, Some(UserRole::Admin));
    }

    #[tokio::test]
    async fn test_rename_and_role_kind_guard() {
        let mem = Memory::new();
        let users = Arc::new(UserRepository::new(mem.dyn_store()));
        let user = User::new("s@dealer.test", "S", "hash", UserRole::Sales);
        users.save(&user).await.unwrap();
        let uc = UpdateUserUseCase::new(users.clone(), mem.uow.clone());

        let to_customer = UpdateUserCommand {
            user_id: user.id.clone(),
            display_name: None,
            role: Some(UserRole::Customer),
        };
        assert_eq!(uc.execute(to_customer, ctx()).await.unwrap_err().code(), "ROLE_CHANGE_NOT_ALLOWED");

        let rename = UpdateUserCommand {
            user_id: user.id.clone(),
            display_name: Some("  Sam  ".into()),
            role: None,
        };
        uc.execute(rename, ctx()).await.unwrap();
        assert_eq!(users.find_by_id(&user.id).await.unwrap().unwrap().display_name, "Sam");
    }
}
