//! Notify Waiting List Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::events::WaitingListNotified;
use crate::details;
use crate::mediator::Command;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, SerializableAggregate, UnitOfWork, UseCaseError, UseCaseResult};
use crate::vehicle::operations::load_vehicle;
use crate::vehicle::repository::VehicleRepository;
use crate::waiting_list::repository::WaitingListRepository;

/// Marks every waiting entry that `vehicle_id` satisfies as notified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyWaitingListCommand {
    pub vehicle_id: String,
}

impl Command for NotifyWaitingListCommand {
    type Output = WaitingListNotified;
}

pub struct NotifyWaitingListUseCase<U: UnitOfWork> {
    entries: Arc<WaitingListRepository>,
    vehicles: Arc<VehicleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> NotifyWaitingListUseCase<U> {
    pub fn new(entries: Arc<WaitingListRepository>, vehicles: Arc<VehicleRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            entries,
            vehicles,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: NotifyWaitingListCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<WaitingListNotified> {
        let vehicle = try_use_case!(load_vehicle(&self.vehicles, &command.vehicle_id).await);
        if !vehicle.is_available() {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "VEHICLE_NOT_AVAILABLE",
                format!("{} is not on the lot", vehicle.title()),
                details! { "vehicleId" => vehicle.id, "status" => vehicle.status.as_str() },
            ));
        }

        let mut matched: Vec<_> = try_use_case!(self.entries.find_waiting_for_make(&vehicle.make).await)
            .into_iter()
            .filter(|e| e.matches(&vehicle))
            .collect();
        if matched.is_empty() {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "NO_MATCHES",
                format!("Nobody is waiting for a {}", vehicle.title()),
            ));
        }
        for entry in &mut matched {
            entry.notify(&vehicle.id);
        }

        let event = WaitingListNotified::new(&ctx, &vehicle.id, &matched);
        let aggregates: Vec<Box<dyn SerializableAggregate>> = matched
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn SerializableAggregate>)
            .collect();
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(NotifyWaitingListUseCase, NotifyWaitingListCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, seed_vehicle, Memory};
    use crate::waiting_list::entity::{WaitingListEntry, WaitingListStatus};

    #[tokio::test]
    async fn test_notifies_matching_entries_only() {
        let mem = Memory::new();
        let entries = Arc::new(WaitingListRepository::new(mem.dyn_store()));
        let vehicles = Arc::new(VehicleRepository::new(mem.dyn_store()));
        // Seeded vehicle is a 2021 Toyota Corolla at 20,000.00
        let vehicle = seed_vehicle(&mem, "2T1BURHE0JC074587").await;

        let mut wants_corolla = WaitingListEntry::new("C1", "toyota");
        wants_corolla.model = Some("Corolla".into());
        let mut too_cheap = WaitingListEntry::new("C2", "Toyota");
        too_cheap.max_price_cents = Some(1_500_000);
        let wants_honda = WaitingListEntry::new("C3", "Honda");
        for entry in [&wants_corolla, &too_cheap, &wants_honda] {
            mem.put(entry).await;
        }

        let uc = NotifyWaitingListUseCase::new(entries.clone(), vehicles, mem.uow.clone());
        let cmd = NotifyWaitingListCommand {
            vehicle_id: vehicle.id.clone(),
        };
        let event = uc.execute(cmd.clone(), ctx()).await.unwrap();
        assert_eq!(event.entry_ids, vec![wants_corolla.id.clone()]);

        let stored = entries.find_by_id(&wants_corolla.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WaitingListStatus::Notified);
        assert_eq!(stored.notified_vehicle_ids, vec![vehicle.id.clone()]);

        // Notified entries are no longer waiting
        assert_eq!(uc.execute(cmd, ctx()).await.unwrap_err().code(), "NO_MATCHES");
    }
}
