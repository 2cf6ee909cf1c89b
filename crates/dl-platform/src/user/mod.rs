//! Users: staff accounts with static role grants, and customer
//! self-service accounts.

pub mod api;
pub mod entity;
pub mod operations;
pub mod permissions;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{User, UserRole};
pub use repository::UserRepository;

use crate::auth::password_service::PasswordService;
use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{GetUserQuery, ListUsersQuery, UserQueries};

pub fn register<U: UnitOfWork + 'static>(
    mediator: &mut Mediator,
    repos: &Repositories,
    passwords: &Arc<PasswordService>,
    unit_of_work: &Arc<U>,
) {
    let users = &repos.users;
    mediator.register_command::<CreateUserCommand, _>(Arc::new(CreateUserUseCase::new(
        users.clone(),
        passwords.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<UpdateUserCommand, _>(Arc::new(UpdateUserUseCase::new(
        users.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<ChangePasswordCommand, _>(Arc::new(ChangePasswordUseCase::new(
        users.clone(),
        passwords.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<DeactivateUserCommand, _>(Arc::new(DeactivateUserUseCase::new(
        users.clone(),
        repos.refresh_tokens.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<ActivateUserCommand, _>(Arc::new(ActivateUserUseCase::new(
        users.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<RegisterCustomerAccountCommand, _>(Arc::new(
        RegisterCustomerAccountUseCase::new(
            users.clone(),
            repos.customers.clone(),
            passwords.clone(),
            unit_of_work.clone(),
        ),
    ));

    let queries = Arc::new(UserQueries::new(users.clone()));
    mediator.register_query::<GetUserQuery, _>(queries.clone());
    mediator.register_query::<ListUsersQuery, _>(queries);
}
