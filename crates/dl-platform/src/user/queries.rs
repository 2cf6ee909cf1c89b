//! User Queries

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::{User, UserRole};
use super::repository::UserRepository;
use crate::mediator::{Query, QueryHandler};
use crate::shared::error::{PlatformError, Result};
use crate::store::Page;

pub struct GetUserQuery {
    pub id: String,
}

impl Query for GetUserQuery {
    type Output = User;
}

#[derive(Debug, Clone, Default)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,
    pub active: Option<bool>,
    pub page: u32,
    pub size: u32,
}

impl Query for ListUsersQuery {
    type Output = Page<User>;
}

pub struct UserQueries {
    users: Arc<UserRepository>,
}

impl UserQueries {
    pub fn new(users: Arc<UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl QueryHandler<GetUserQuery> for UserQueries {
    async fn handle(&self, query: GetUserQuery) -> Result<User> {
        self.users
            .find_by_id(&query.id)
            .await?
            .ok_or_else(|| PlatformError::not_found("User", &query.id))
    }
}

#[async_trait]
impl QueryHandler<ListUsersQuery> for UserQueries {
    async fn handle(&self, query: ListUsersQuery) -> Result<Page<User>> {
        self.users.search(query.role, query.active, query.page, query.size).await
    }
}
