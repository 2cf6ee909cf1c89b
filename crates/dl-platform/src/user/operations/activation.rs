//! Activate / Deactivate User Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::events::{UserActivated, UserDeactivated};
use crate::auth::refresh_token_repository::RefreshTokenRepository;
use crate::mediator::Command;
use crate::try_use_case;
use crate::user::entity::{User, UserRole};
use crate::user::repository::UserRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

async fn load(users: &UserRepository, id: &str) -> Result<User, UseCaseError> {
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("USER_NOT_FOUND", format!("User '{}' not found", id)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateUserCommand {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Command for DeactivateUserCommand {
    type Output = UserDeactivated;
}

/// Deactivation also revokes every refresh token of the user, so open
/// sessions end once their access token expires.
pub struct DeactivateUserUseCase<U: UnitOfWork> {
    users: Arc<UserRepository>,
    refresh_tokens: Arc<RefreshTokenRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> DeactivateUserUseCase<U> {
    pub fn new(users: Arc<UserRepository>, refresh_tokens: Arc<RefreshTokenRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            users,
            refresh_tokens,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: DeactivateUserCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<UserDeactivated> {
        let mut user = try_use_case!(load(&self.users, &command.user_id).await);

        if user.id == ctx.principal_id {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "CANNOT_DEACTIVATE_SELF",
                "You cannot deactivate your own account",
            ));
        }
        if !user.active {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "ALREADY_DEACTIVATED",
                "User is already deactivated",
            ));
        }
        if user.role == UserRole::Admin && try_use_case!(self.users.count_active_admins().await) <= 1 {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "LAST_ADMIN",
                "Cannot deactivate the last active administrator",
            ));
        }

        user.active = false;
        user.touch();

        let event = UserDeactivated::new(&ctx, &user, command.reason.as_deref());
        let result = self.unit_of_work.commit(&user, event, &command).await;

        if result.is_success() {
            match self.refresh_tokens.revoke_all_for_principal(&user.id).await {
                Ok(revoked) => info!(user_id = %user.id, revoked, "Revoked sessions of deactivated user"),
                Err(e) => warn!(user_id = %user.id, error = %e, "Failed to revoke sessions of deactivated user"),
            }
        }
        result
    }
}

crate::impl_command_handler!(DeactivateUserUseCase, DeactivateUserCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateUserCommand {
    pub user_id: String,
}

impl Command for ActivateUserCommand {
    type Output = UserActivated;
}

pub struct ActivateUserUseCase<U: UnitOfWork> {
    users: Arc<UserRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> ActivateUserUseCase<U> {
    pub fn new(users: Arc<UserRepository>, unit_of_work: Arc<U>) -> Self {
        Self { users, unit_of_work }
    }

    pub async fn execute(&self, command: ActivateUserCommand, ctx: ExecutionContext) -> UseCaseResult<UserActivated> {
        let mut user = try_use_case!(load(&self.users, &command.user_id).await);

        if user.active {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "ALREADY_ACTIVE",
                "User is already active",
            ));
        }

        user.active = true;
        user.touch();

        let event = UserActivated::new(&ctx, &user);
        self.unit_of_work.commit(&user, event, &command).await
    }
}

crate::impl_command_handler!(ActivateUserUseCase, ActivateUserCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::refresh_token::RefreshToken;
    use crate::test_support::{ctx, Memory};
    use chrono::Duration;

    struct Fixture {
        mem: Memory,
        users: Arc<UserRepository>,
        tokens: Arc<RefreshTokenRepository>,
    }

    fn fixture() -> Fixture {
        let mem = Memory::new();
        let users = Arc::new(UserRepository::new(mem.dyn_store()));
        let tokens = Arc::new(RefreshTokenRepository::new(mem.dyn_store()));
        Fixture { mem, users, tokens }
    }

    #[tokio::test]
    async fn test_deactivate_revokes_sessions() {
        let f = fixture();
        let user = User::new("s@dealer.test", "S", "hash", UserRole::Sales);
        f.users.save(&user).await.unwrap();
        let (_, token) = RefreshToken::issue(&user.id, Duration::days(1));
        f.tokens.insert(&token).await.unwrap();

        let uc = DeactivateUserUseCase::new(f.users.clone(), f.tokens.clone(), f.mem.uow.clone());
        let command = DeactivateUserCommand { user_id: user.id.clone(), reason: Some("Left".into()) };
        uc.execute(command.clone(), ctx()).await.unwrap();

        assert!(!f.users.find_by_id(&user.id).await.unwrap().unwrap().active);
        assert!(f.tokens.find_active_by_principal(&user.id).await.unwrap().is_empty());
        assert_eq!(uc.execute(command, ctx()).await.unwrap_err().code(), "ALREADY_DEACTIVATED");

        let activate = ActivateUserUseCase::new(f.users.clone(), f.mem.uow.clone());
        activate.execute(ActivateUserCommand { user_id: user.id.clone() }, ctx()).await.unwrap();
        assert!(f.users.find_by_id(&user.id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn test_self_and_last_admin_guards() {
        let f = fixture();
        let admin = User::new("root@dealer.test", "Root", "hash", UserRole::Admin);
        f.users.save(&admin).await.unwrap();
        let uc = DeactivateUserUseCase::new(f.users.clone(), f.tokens.clone(), f.mem.uow.clone());

        let own = ExecutionContext::create(admin.id.clone());
        let command = DeactivateUserCommand { user_id: admin.id.clone(), reason: None };
        assert_eq!(uc.execute(command.clone(), own).await.unwrap_err().code(), "CANNOT_DEACTIVATE_SELF");
        assert_eq!(uc.execute(command, ctx()).await.unwrap_err().code(), "LAST_ADMIN");
    }
}
