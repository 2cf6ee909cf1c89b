//! User Repository

use std::sync::Arc;

use bson::{doc, Document};
use chrono::{DateTime, Utc};

use super::entity::{User, UserRole};
use crate::shared::error::Result;
use crate::store::{DocumentStore, Page, TypedCollection};
use crate::usecase::HasId;

pub struct UserRepository {
    collection: TypedCollection<User>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, User::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.collection.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.collection
            .find_one(doc! { "email": email.trim().to_lowercase() })
            .await
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        self.collection
            .exists(doc! { "email": email.trim().to_lowercase() })
            .await
    }

    pub async fn count_active_admins(&self) -> Result<u64> {
        self.collection
            .count(doc! { "role": UserRole::Admin.as_str(), "active": true })
            .await
    }

    pub async fn search(
        &self,
        role: Option<UserRole>,
        active: Option<bool>,
        page: u32,
        size: u32,
    ) -> Result<Page<User>> {
        let mut filter = Document::new();
        if let Some(role) = role {
            filter.insert("role", role.as_str());
        }
        if let Some(active) = active {
            filter.insert("active", active);
        }
        self.collection
            .find_page(filter, doc! { "email": 1 }, page, size)
            .await
    }

    /// Direct write for accounts created outside a use case (bootstrap).
    pub async fn save(&self, user: &User) -> Result<()> {
        self.collection.save(&user.id, user).await
    }

    /// Stamp the last login without touching the rest of the document, so
    /// a concurrent commit on the same user is neither lost nor clobbered.
    pub async fn record_login(&self, user_id: &str, at: DateTime<Utc>) -> Result<()> {
        self.collection
            .update_many(
                doc! { "_id": user_id },
                doc! { "lastLoginAt": bson::DateTime::from_chrono(at) },
            )
            .await?;
        Ok(())
    }
}
