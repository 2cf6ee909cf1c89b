//! Customer requests for vehicles that are not in stock yet.

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{WaitingListEntry, WaitingListStatus};
pub use repository::WaitingListRepository;

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{GetWaitingListEntryQuery, ListWaitingListQuery, WaitingListQueries};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    let entries = &repos.waiting_list;
    mediator.register_command::<JoinWaitingListCommand, _>(Arc::new(JoinWaitingListUseCase::new(
        entries.clone(),
        repos.customers.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<LeaveWaitingListCommand, _>(Arc::new(LeaveWaitingListUseCase::new(
        entries.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<FulfillWaitingListEntryCommand, _>(Arc::new(FulfillWaitingListEntryUseCase::new(
        entries.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<NotifyWaitingListCommand, _>(Arc::new(NotifyWaitingListUseCase::new(
        entries.clone(),
        repos.vehicles.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(WaitingListQueries::new(entries.clone()));
    mediator.register_query::<GetWaitingListEntryQuery, _>(queries.clone());
    mediator.register_query::<ListWaitingListQuery, _>(queries);
}
