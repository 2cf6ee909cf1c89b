//! Change Password Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::events::UserPasswordChanged;
use crate::auth::password_service::PasswordService;
use crate::mediator::Command;
use crate::try_use_case;
use crate::user::repository::UserRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

/// Check a new password against the policy and hash it.
pub(crate) fn hash_new_password(passwords: &PasswordService, raw: &str) -> Result<String, UseCaseError> {
    if let Err(violations) = passwords.policy().validate(raw) {
        return Err(UseCaseError::validation("WEAK_PASSWORD", violations.join("; ")));
    }
    passwords.hash_password(raw).map_err(UseCaseError::from)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordCommand {
    pub user_id: String,
    #[serde(skip_serializing)]
    pub current_password: String,
    #[serde(skip_serializing)]
    pub new_password: String,
}

impl Command for ChangePasswordCommand {
    type Output = UserPasswordChanged;
}

pub struct ChangePasswordUseCase<U: UnitOfWork> {
    users: Arc<UserRepository>,
    passwords: Arc<PasswordService>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> ChangePasswordUseCase<U> {
    pub fn new(users: Arc<UserRepository>, passwords: Arc<PasswordService>, unit_of_work: Arc<U>) -> Self {
        Self {
            users,
            passwords,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: ChangePasswordCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<UserPasswordChanged> {
        let Some(mut user) = try_use_case!(self.users.find_by_id(&command.user_id).await) else {
            return UseCaseResult::failure(UseCaseError::not_found(
                "USER_NOT_FOUND",
                format!("User '{}' not found", command.user_id),
            ));
        };

        if !try_use_case!(self.passwords.verify_password(&command.current_password, &user.password_hash)) {
            return UseCaseResult::failure(UseCaseError::validation(
                "INVALID_CURRENT_PASSWORD",
                "Current password is incorrect",
            ));
        }
        if command.current_password == command.new_password {
            return UseCaseResult::failure(UseCaseError::validation(
                "PASSWORD_UNCHANGED",
                "New password must differ from the current one",
            ));
        }

        user.password_hash = try_use_case!(hash_new_password(&self.passwords, &command.new_password));
        user.touch();

        let event = UserPasswordChanged::new(&ctx, &user);
        self.unit_of_work.commit(&user, event, &command).await
    }
}

crate::impl_command_handler!(ChangePasswordUseCase, ChangePasswordCommand);
