//! Add Customer Note / Delete Customer Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::{CustomerDeleted, CustomerNoteAdded};
use super::load_customer;
use crate::customer::repository::CustomerRepository;
use crate::mediator::Command;
use crate::sales_order::repository::SalesOrderRepository;
use crate::shared::validation::{max_length, required};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

pub const MAX_NOTE_LENGTH: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCustomerNoteCommand {
    pub customer_id: String,
    pub text: String,
}

impl Command for AddCustomerNoteCommand {
    type Output = CustomerNoteAdded;
}

pub struct AddCustomerNoteUseCase<U: UnitOfWork> {
    customers: Arc<CustomerRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> AddCustomerNoteUseCase<U> {
    pub fn new(customers: Arc<CustomerRepository>, unit_of_work: Arc<U>) -> Self {
        Self { customers, unit_of_work }
    }

    pub async fn execute(&self, command: AddCustomerNoteCommand, ctx: ExecutionContext) -> UseCaseResult<CustomerNoteAdded> {
        let text = try_use_case!(required(&command.text, "NOTE_REQUIRED", "Note text"));
        try_use_case!(max_length(&text, MAX_NOTE_LENGTH, "NOTE_TOO_LONG", "Note text"));

        let mut customer = try_use_case!(load_customer(&self.customers, &command.customer_id).await);
        let note_id = customer.add_note(text.as_str(), ctx.principal_id.as_str()).id.clone();

        let event = CustomerNoteAdded::new(&ctx, &customer.id, &note_id, &text);
        self.unit_of_work.commit(&customer, event, &command).await
    }
}

crate::impl_command_handler!(AddCustomerNoteUseCase, AddCustomerNoteCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCustomerCommand {
    pub customer_id: String,
}

impl Command for DeleteCustomerCommand {
    type Output = CustomerDeleted;
}

pub struct DeleteCustomerUseCase<U: UnitOfWork> {
    customers: Arc<CustomerRepository>,
    sales_orders: Arc<SalesOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> DeleteCustomerUseCase<U> {
    pub fn new(customers: Arc<CustomerRepository>, sales_orders: Arc<SalesOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            customers,
            sales_orders,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: DeleteCustomerCommand, ctx: ExecutionContext) -> UseCaseResult<CustomerDeleted> {
        let customer = try_use_case!(load_customer(&self.customers, &command.customer_id).await);

        let active_orders = try_use_case!(self.sales_orders.count_active_for_customer(&customer.id).await);
        if active_orders > 0 {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "CUSTOMER_HAS_ORDERS",
                format!("Customer has {} sales order(s) that are not cancelled", active_orders),
            ));
        }
        if customer.user_id.is_some() {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "CUSTOMER_HAS_ACCOUNT",
                "Customer has a self-service account; deactivate it instead",
            ));
        }

        let event = CustomerDeleted::new(&ctx, &customer);
        self.unit_of_work.commit_delete(&customer, event, &command).await
    }
}

crate::impl_command_handler!(DeleteCustomerUseCase, DeleteCustomerCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales_order::entity::{SalesOrder, SalesOrderStatus};
    use crate::test_support::{ctx, seed_customer, Memory};

    #[tokio::test]
    async fn test_add_note_records_author() {
        let mem = Memory::new();
        let repo = Arc::new(CustomerRepository::new(mem.dyn_store()));
        let customer = seed_customer(&mem, "ada@example.com").await;
        let uc = AddCustomerNoteUseCase::new(repo.clone(), mem.uow.clone());

        let command = AddCustomerNoteCommand {
            customer_id: customer.id.clone(),
            text: "Interested in hybrids".into(),
        };
        let event = uc.execute(command, ctx()).await.unwrap();

        let stored = repo.find_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.notes.len(), 1);
        assert_eq!(stored.notes[0].id, event.note_id);
        assert_eq!(stored.notes[0].author_id, "staff-1");

        let blank = AddCustomerNoteCommand {
            customer_id: customer.id.clone(),
            text: "  ".into(),
        };
        assert_eq!(uc.execute(blank, ctx()).await.unwrap_err().code(), "NOTE_REQUIRED");
    }

    #[tokio::test]
    async fn test_delete_blocked_by_active_order() {
        let mem = Memory::new();
        let customers = Arc::new(CustomerRepository::new(mem.dyn_store()));
        let orders = Arc::new(SalesOrderRepository::new(mem.dyn_store()));
        let customer = seed_customer(&mem, "ada@example.com").await;
        let mut order = SalesOrder::new(&customer.id, "V1", "staff-1", 2_000_000, 0).unwrap();
        mem.put(&order).await;

        let uc = DeleteCustomerUseCase::new(customers.clone(), orders, mem.uow.clone());
        let command = DeleteCustomerCommand { customer_id: customer.id.clone() };
        assert_eq!(uc.execute(command.clone(), ctx()).await.unwrap_err().code(), "CUSTOMER_HAS_ORDERS");

        order.status = SalesOrderStatus::Cancelled;
        mem.put(&order).await;
        uc.execute(command, ctx()).await.unwrap();
        assert!(customers.find_by_id(&customer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_blocked_by_linked_account() {
        let mem = Memory::new();
        let customers = Arc::new(CustomerRepository::new(mem.dyn_store()));
        let orders = Arc::new(SalesOrderRepository::new(mem.dyn_store()));
        let mut customer = seed_customer(&mem, "ada@example.com").await;
        customer.user_id = Some("U1".into());
        mem.put(&customer).await;

        let uc = DeleteCustomerUseCase::new(customers, orders, mem.uow.clone());
        let result = uc.execute(DeleteCustomerCommand { customer_id: customer.id }, ctx()).await;
        assert_eq!(result.unwrap_err().code(), "CUSTOMER_HAS_ACCOUNT");
    }
}
