//! Register Customer Account Use Case
//!
//! Self-service sign-up. Creates a `CUSTOMER` user together with its
//! customer record, or links the user to a customer staff already created
//! under the same email.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::CustomerAccountRegistered;
use super::password::hash_new_password;
use crate::auth::password_service::PasswordService;
use crate::customer::entity::Customer;
use crate::customer::repository::CustomerRepository;
use crate::mediator::Command;
use crate::shared::validation::{normalize_email, optional, required};
use crate::try_use_case;
use crate::user::entity::{User, UserRole};
use crate::user::repository::UserRepository;
use crate::usecase::{ExecutionContext, SerializableAggregate, UnitOfWork, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerAccountCommand {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Command for RegisterCustomerAccountCommand {
    type Output = CustomerAccountRegistered;
}

pub struct RegisterCustomerAccountUseCase<U: UnitOfWork> {
    users: Arc<UserRepository>,
    customers: Arc<CustomerRepository>,
    passwords: Arc<PasswordService>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> RegisterCustomerAccountUseCase<U> {
    pub fn new(
        users: Arc<UserRepository>,
        customers: Arc<CustomerRepository>,
        passwords: Arc<PasswordService>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            users,
            customers,
            passwords,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: RegisterCustomerAccountCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<CustomerAccountRegistered> {
        let email = try_use_case!(normalize_email(&command.email));
        let first_name = try_use_case!(required(&command.first_name, "FIRST_NAME_REQUIRED", "First name"));
        let last_name = try_use_case!(required(&command.last_name, "LAST_NAME_REQUIRED", "Last name"));

        if try_use_case!(self.users.exists_by_email(&email).await) {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "EMAIL_TAKEN",
                "An account with this email already exists",
            ));
        }

        let (mut customer, linked) = match try_use_case!(self.customers.find_by_email(&email).await) {
            Some(existing) if existing.user_id.is_some() => {
                return UseCaseResult::failure(UseCaseError::business_rule(
                    "EMAIL_TAKEN",
                    "An account with this email already exists",
                ));
            }
            Some(existing) => (existing, true),
            None => {
                let mut customer = Customer::new(first_name.as_str(), last_name.as_str(), email.as_str());
                customer.phone = optional(command.phone.as_deref());
                (customer, false)
            }
        };

        let hash = try_use_case!(hash_new_password(&self.passwords, &command.password));
        let mut user = User::new(email, format!("{} {}", first_name, last_name), hash, UserRole::Customer);
        user.customer_id = Some(customer.id.clone());
        customer.user_id = Some(user.id.clone());
        customer.touch();

        let event = CustomerAccountRegistered::new(&ctx, &user, &customer.id, linked);
        let aggregates: Vec<Box<dyn SerializableAggregate>> = vec![Box::new(user), Box::new(customer)];
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(RegisterCustomerAccountUseCase, RegisterCustomerAccountCommand);
