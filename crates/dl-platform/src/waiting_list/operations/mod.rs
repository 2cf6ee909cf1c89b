//! Waiting List Operations

pub mod events;
pub mod join;
pub mod notify;

pub use events::*;
pub use join::{
    FulfillWaitingListEntryCommand, FulfillWaitingListEntryUseCase, JoinWaitingListCommand, JoinWaitingListUseCase,
    LeaveWaitingListCommand, LeaveWaitingListUseCase,
};
pub use notify::{NotifyWaitingListCommand, NotifyWaitingListUseCase};

use super::entity::WaitingListEntry;
use super::repository::WaitingListRepository;
use crate::usecase::UseCaseError;

pub(crate) async fn load_entry(entries: &WaitingListRepository, id: &str) -> Result<WaitingListEntry, UseCaseError> {
    entries
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("ENTRY_NOT_FOUND", format!("Waiting-list entry '{}' not found", id)))
}
