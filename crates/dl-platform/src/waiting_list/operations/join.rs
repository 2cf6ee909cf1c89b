//! Join / Leave / Fulfil Waiting List Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::{WaitingListEntryClosed, WaitingListJoined};
use super::load_entry;
use crate::customer::operations::load_customer;
use crate::customer::repository::CustomerRepository;
use crate::details;
use crate::mediator::Command;
use crate::shared::validation::{invalid_transition, optional, required};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::entity::{validate_year, VehicleCondition};
use crate::waiting_list::entity::{WaitingListEntry, WaitingListStatus};
use crate::waiting_list::repository::WaitingListRepository;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinWaitingListCommand {
    #[serde(default)]
    pub customer_id: String,
    pub make: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub min_year: Option<i32>,
    #[serde(default)]
    pub max_year: Option<i32>,
    #[serde(default)]
    pub max_price_cents: Option<i64>,
    #[serde(default)]
    pub condition: Option<VehicleCondition>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Command for JoinWaitingListCommand {
    type Output = WaitingListJoined;
}

pub struct JoinWaitingListUseCase<U: UnitOfWork> {
    entries: Arc<WaitingListRepository>,
    customers: Arc<CustomerRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> JoinWaitingListUseCase<U> {
    pub fn new(entries: Arc<WaitingListRepository>, customers: Arc<CustomerRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            entries,
            customers,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: JoinWaitingListCommand, ctx: ExecutionContext) -> UseCaseResult<WaitingListJoined> {
        let make = try_use_case!(required(&command.make, "MAKE_REQUIRED", "Make"));
        let model = optional(command.model.as_deref());
        let min_year = match command.min_year {
            Some(year) => Some(try_use_case!(validate_year(year))),
            None => None,
        };
        let max_year = match command.max_year {
            Some(year) => Some(try_use_case!(validate_year(year))),
            None => None,
        };
        if let (Some(min), Some(max)) = (min_year, max_year) {
            if min > max {
                return UseCaseResult::failure(UseCaseError::validation(
                    "INVALID_YEAR_RANGE",
                    "Minimum year cannot be after maximum year",
                ));
            }
        }
        if command.max_price_cents.is_some_and(|p| p <= 0) {
            return UseCaseResult::failure(UseCaseError::validation(
                "INVALID_PRICE",
                "Maximum price must be greater than zero",
            ));
        }

        let customer = try_use_case!(load_customer(&self.customers, &command.customer_id).await);
        let active = try_use_case!(self.entries.find_active_for_customer(&customer.id).await);
        if let Some(existing) = active.iter().find(|e| e.is_same_request(&make, model.as_deref())) {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "DUPLICATE_ENTRY",
                "Customer is already waiting for this vehicle",
                details! { "entryId" => existing.id },
            ));
        }

        let mut entry = WaitingListEntry::new(customer.id, make);
        entry.model = model;
        entry.min_year = min_year;
        entry.max_year = max_year;
        entry.max_price_cents = command.max_price_cents;
        entry.condition = command.condition;
        entry.notes = optional(command.notes.as_deref());

        let event = WaitingListJoined::new(&ctx, &entry);
        self.unit_of_work.commit(&entry, event, &command).await
    }
}

crate::impl_command_handler!(JoinWaitingListUseCase, JoinWaitingListCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveWaitingListCommand {
    pub entry_id: String,
}

impl Command for LeaveWaitingListCommand {
    type Output = WaitingListEntryClosed;
}

pub struct LeaveWaitingListUseCase<U: UnitOfWork> {
    entries: Arc<WaitingListRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> LeaveWaitingListUseCase<U> {
    pub fn new(entries: Arc<WaitingListRepository>, unit_of_work: Arc<U>) -> Self {
        Self { entries, unit_of_work }
    }

    pub async fn execute(
        &self,
        command: LeaveWaitingListCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<WaitingListEntryClosed> {
        let mut entry = try_use_case!(load_entry(&self.entries, &command.entry_id).await);
        if !entry.status.is_active() {
            return UseCaseResult::failure(invalid_transition(
                "Waiting-list entry",
                entry.status.as_str(),
                WaitingListStatus::Cancelled.as_str(),
            ));
        }

        let previous = entry.status;
        entry.cancel();

        let event = WaitingListEntryClosed::new(&ctx, &entry, previous);
        self.unit_of_work.commit(&entry, event, &command).await
    }
}

crate::impl_command_handler!(LeaveWaitingListUseCase, LeaveWaitingListCommand);

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FulfillWaitingListEntryCommand {
    #[serde(default)]
    pub entry_id: String,
    /// Vehicle the customer ended up buying, if known
    #[serde(default)]
    pub vehicle_id: Option<String>,
}

impl Command for FulfillWaitingListEntryCommand {
    type Output = WaitingListEntryClosed;
}

pub struct FulfillWaitingListEntryUseCase<U: UnitOfWork> {
    entries: Arc<WaitingListRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> FulfillWaitingListEntryUseCase<U> {
    pub fn new(entries: Arc<WaitingListRepository>, unit_of_work: Arc<U>) -> Self {
        Self { entries, unit_of_work }
    }

    pub async fn execute(
        &self,
        command: FulfillWaitingListEntryCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<WaitingListEntryClosed> {
        let mut entry = try_use_case!(load_entry(&self.entries, &command.entry_id).await);
        if !entry.status.is_active() {
            return UseCaseResult::failure(invalid_transition(
                "Waiting-list entry",
                entry.status.as_str(),
                WaitingListStatus::Fulfilled.as_str(),
            ));
        }

        let previous = entry.status;
        entry.fulfill(optional(command.vehicle_id.as_deref()));

        let event = WaitingListEntryClosed::new(&ctx, &entry, previous);
        self.unit_of_work.commit(&entry, event, &command).await
    }
}

crate::impl_command_handler!(FulfillWaitingListEntryUseCase, FulfillWaitingListEntryCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_customer, Memory};

    fn join(customer_id: &str, make: &str, model: Option<&str>) -> JoinWaitingListCommand {
        JoinWaitingListCommand {
            customer_id: customer_id.into(),
            make: make.into(),
            model: model.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_join_rejects_duplicate_request() {
        let mem = Memory::new();
        let customer = seed_customer(&mem, "ada@example.com").await;
        let entries = Arc::new(WaitingListRepository::new(mem.dyn_store()));
        let uc = JoinWaitingListUseCase::new(
            entries.clone(),
            Arc::new(CustomerRepository::new(mem.dyn_store())),
            mem.uow.clone(),
        );

        uc.execute(join(&customer.id, "Toyota", Some("Corolla")), ctx()).await.unwrap();
        let dup = uc.execute(join(&customer.id, "TOYOTA", Some("corolla")), ctx()).await;
        assert_eq!(dup.unwrap_err().code(), "DUPLICATE_ENTRY");

        // Any Toyota is a different request than a Corolla
        uc.execute(join(&customer.id, "Toyota", None), ctx()).await.unwrap();

        let bad_range = JoinWaitingListCommand {
            min_year: Some(2022),
            max_year: Some(2020),
            ..join(&customer.id, "Honda", None)
        };
        assert_eq!(uc.execute(bad_range, ctx()).await.unwrap_err().code(), "INVALID_YEAR_RANGE");
        assert_eq!(mem.event_count("waiting-list:joined").await, 2);
    }

    #[tokio::test]
    async fn test_leave_then_fulfil_fails() {
        let mem = Memory::new();
        let entries = Arc::new(WaitingListRepository::new(mem.dyn_store()));
        let entry = WaitingListEntry::new("C1", "Toyota");
        mem.put(&entry).await;

        let leave = LeaveWaitingListUseCase::new(entries.clone(), mem.uow.clone());
        let event = leave
            .execute(LeaveWaitingListCommand { entry_id: entry.id.clone() }, ctx())
            .await
            .unwrap();
        assert_eq!(event.status, WaitingListStatus::Cancelled);

        let fulfil = FulfillWaitingListEntryUseCase::new(entries, mem.uow.clone());
        let cmd = FulfillWaitingListEntryCommand {
            entry_id: entry.id.clone(),
            vehicle_id: None,
        };
        assert_eq!(fulfil.execute(cmd, ctx()).await.unwrap_err().code(), "INVALID_STATUS_TRANSITION");
    }
}
