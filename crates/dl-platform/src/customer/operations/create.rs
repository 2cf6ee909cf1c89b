//! Create / Update Customer Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::{CustomerCreated, CustomerUpdated};
use super::load_customer;
use crate::customer::entity::{Address, Customer};
use crate::customer::repository::CustomerRepository;
use crate::mediator::Command;
use crate::shared::validation::{normalize_email, optional, required};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerCommand {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

impl Command for CreateCustomerCommand {
    type Output = CustomerCreated;
}

pub struct CreateCustomerUseCase<U: UnitOfWork> {
    customers: Arc<CustomerRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CreateCustomerUseCase<U> {
    pub fn new(customers: Arc<CustomerRepository>, unit_of_work: Arc<U>) -> Self {
        Self { customers, unit_of_work }
    }

    pub async fn execute(&self, command: CreateCustomerCommand, ctx: ExecutionContext) -> UseCaseResult<CustomerCreated> {
        let first_name = try_use_case!(required(&command.first_name, "FIRST_NAME_REQUIRED", "First name"));
        let last_name = try_use_case!(required(&command.last_name, "LAST_NAME_REQUIRED", "Last name"));
        let email = try_use_case!(normalize_email(&command.email));

        if try_use_case!(self.customers.exists_by_email(&email).await) {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "EMAIL_TAKEN",
                format!("A customer with email '{}' already exists", email),
            ));
        }

        let mut customer = Customer::new(first_name, last_name, email);
        customer.phone = optional(command.phone.as_deref());
        customer.address = command.address.clone();

        let event = CustomerCreated::new(&ctx, &customer);
        self.unit_of_work.commit(&customer, event, &command).await
    }
}

crate::impl_command_handler!(CreateCustomerUseCase, CreateCustomerCommand);

/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerCommand {
    pub customer_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

impl Command for UpdateCustomerCommand {
    type Output = CustomerUpdated;
}

pub struct UpdateCustomerUseCase<U: UnitOfWork> {
    customers: Arc<CustomerRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> UpdateCustomerUseCase<U> {
    pub fn new(customers: Arc<CustomerRepository>, unit_of_work: Arc<U>) -> Self {
        Self { customers, unit_of_work }
    }

    pub async fn execute(&self, command: UpdateCustomerCommand, ctx: ExecutionContext) -> UseCaseResult<CustomerUpdated> {
        let mut customer = try_use_case!(load_customer(&self.customers, &command.customer_id).await);

        if let Some(ref first_name) = command.first_name {
            customer.first_name = try_use_case!(required(first_name, "FIRST_NAME_REQUIRED", "First name"));
        }
        if let Some(ref last_name) = command.last_name {
            customer.last_name = try_use_case!(required(last_name, "LAST_NAME_REQUIRED", "Last name"));
        }

        let mut previous_email = None;
        if let Some(ref email) = command.email {
            let email = try_use_case!(normalize_email(email));
            if email != customer.email {
                if try_use_case!(self.customers.exists_by_email(&email).await) {
                    return UseCaseResult::failure(UseCaseError::business_rule(
                        "EMAIL_TAKEN",
                        format!("A customer with email '{}' already exists", email),
                    ));
                }
                previous_email = Some(std::mem::replace(&mut customer.email, email));
            }
        }

        if let Some(ref phone) = command.phone {
            customer.phone = optional(Some(phone.as_str()));
        }
        if let Some(ref address) = command.address {
            customer.address = Some(address.clone());
        }
        customer.touch();

        let event = CustomerUpdated::new(&ctx, &customer, previous_email);
        self.unit_of_work.commit(&customer, event, &command).await
    }
}

crate::impl_command_handler!(UpdateCustomerUseCase, UpdateCustomerCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_customer, Memory};

    fn command(email: &str) -> CreateCustomerCommand {
        CreateCustomerCommand {
            first_name: " Grace ".into(),
            last_name: "Hopper".into(),
            email: email.into(),
            phone: Some("555-0199".into()),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_create_customer() {
        let mem = Memory::new();
        let repo = Arc::new(CustomerRepository::new(mem.dyn_store()));
        let uc = CreateCustomerUseCase::new(repo.clone(), mem.uow.clone());

        let event = uc.execute(command("Grace@Navy.test"), ctx()).await.unwrap();
        let stored = repo.find_by_id(&event.customer_id).await.unwrap().unwrap();
        assert_eq!(stored.first_name, "Grace");
        assert_eq!(stored.email, "grace@navy.test");
        assert_eq!(stored.phone.as_deref(), Some("555-0199"));

        let dup = uc.execute(command("GRACE@navy.test"), ctx()).await;
        assert_eq!(dup.unwrap_err().code(), "EMAIL_TAKEN");

        let mut blank = command("other@navy.test");
        blank.last_name = " ".into();
        assert_eq!(uc.execute(blank, ctx()).await.unwrap_err().code(), "LAST_NAME_REQUIRED");
    }

    #[tokio::test]
    async fn test_update_customer_email() {
        let mem = Memory::new();
        let repo = Arc::new(CustomerRepository::new(mem.dyn_store()));
        let ada = seed_customer(&mem, "ada@example.com").await;
        seed_customer(&mem, "taken@example.com").await;
        let uc = UpdateCustomerUseCase::new(repo.clone(), mem.uow.clone());

        let taken = UpdateCustomerCommand {
            customer_id: ada.id.clone(),
            email: Some("Taken@example.com".into()),
            ..Default::default()
        };
        assert_eq!(uc.execute(taken, ctx()).await.unwrap_err().code(), "EMAIL_TAKEN");

        let change = UpdateCustomerCommand {
            customer_id: ada.id.clone(),
            email: Some("countess@example.com".into()),
            phone: Some("".into()),
            ..Default::default()
        };
        let event = uc.execute(change, ctx()).await.unwrap();
        assert_eq!(event.previous_email.as_deref(), Some("ada@example.com"));
        let stored = repo.find_by_id(&ada.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "countess@example.com");
        assert_eq!(stored.phone, None);
    }
}
