//! Waiting List Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::{WaitingListEntry, WaitingListStatus};
use super::repository::WaitingListRepository;
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetWaitingListEntryQuery {
    pub id: String,
}

impl Query for GetWaitingListEntryQuery {
    type Output = WaitingListEntry;
}

#[derive(Debug, Clone, Default)]
pub struct ListWaitingListQuery {
    pub status: Option<WaitingListStatus>,
    pub customer_id: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl Query for ListWaitingListQuery {
    type Output = Page<WaitingListEntry>;
}

pub struct WaitingListQueries {
    entries: Arc<WaitingListRepository>,
}

impl WaitingListQueries {
    pub fn new(entries: Arc<WaitingListRepository>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl QueryHandler<GetWaitingListEntryQuery> for WaitingListQueries {
    async fn handle(&self, query: GetWaitingListEntryQuery) -> Result<WaitingListEntry> {
        self.entries
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("WaitingListEntry", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListWaitingListQuery> for WaitingListQueries {
    async fn handle(&self, query: ListWaitingListQuery) -> Result<Page<WaitingListEntry>> {
        self.entries
            .search(query.status, query.customer_id.as_deref(), query.page, query.size)
            .await
    }
}
