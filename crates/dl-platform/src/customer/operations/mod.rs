//! Customer Operations

pub mod create;
pub mod events;
pub mod notes;

pub use create::{CreateCustomerCommand, CreateCustomerUseCase, UpdateCustomerCommand, UpdateCustomerUseCase};
pub use events::*;
pub use notes::{AddCustomerNoteCommand, AddCustomerNoteUseCase, DeleteCustomerCommand, DeleteCustomerUseCase};

use super::entity::Customer;
use super::repository::CustomerRepository;
use crate::usecase::UseCaseError;

pub(crate) async fn load_customer(customers: &CustomerRepository, id: &str) -> Result<Customer, UseCaseError> {
    customers
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("CUSTOMER_NOT_FOUND", format!("Customer '{}' not found", id)))
}
