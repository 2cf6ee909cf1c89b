//! Refresh Token Repository

use std::sync::Arc;

use bson::doc;
use chrono::Utc;

use super::refresh_token::RefreshToken;
use crate::shared::error::Result;
use crate::store::{DocumentStore, FindOptions, TypedCollection};

pub struct RefreshTokenRepository {
    collection: TypedCollection<RefreshToken>,
}

impl RefreshTokenRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, "refresh_tokens"),
        }
    }

    pub async fn insert(&self, token: &RefreshToken) -> Result<()> {
        self.collection.insert(token).await
    }

    /// Look up by the hash of the raw token presented by the client.
    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        self.collection.find_one(doc! { "tokenHash": token_hash }).await
    }

    pub async fn find_active_by_principal(&self, principal_id: &str) -> Result<Vec<RefreshToken>> {
        let now = bson::DateTime::from_chrono(Utc::now());
        self.collection
            .find(
                doc! { "principalId": principal_id, "revoked": false, "expiresAt": { "$gt": now } },
                FindOptions::default(),
            )
            .await
    }

    /// Retire a live token in favour of its successor. The filter and the
    /// write are one atomic update, so at most one caller gets `true`.
    pub async fn claim_rotation(&self, token_hash: &str, successor_hash: &str) -> Result<bool> {
        let now = bson::DateTime::from_chrono(Utc::now());
        let claimed = self
            .collection
            .update_many(
                doc! { "tokenHash": token_hash, "revoked": false, "replacedBy": { "$exists": false } },
                doc! { "revoked": true, "revokedAt": now, "replacedBy": successor_hash },
            )
            .await?;
        Ok(claimed > 0)
    }

    /// Revoke every token in a rotation chain.
    pub async fn revoke_family(&self, family: &str) -> Result<u64> {
        let now = bson::DateTime::from_chrono(Utc::now());
        self.collection
            .update_many(
                doc! { "tokenFamily": family, "revoked": false },
                doc! { "revoked": true, "revokedAt": now },
            )
            .await
    }

    /// Revoke every token issued to a user (logout everywhere, deactivation).
    pub async fn revoke_all_for_principal(&self, principal_id: &str) -> Result<u64> {
        let now = bson::DateTime::from_chrono(Utc::now());
        self.collection
            .update_many(
                doc! { "principalId": principal_id, "revoked": false },
                doc! { "revoked": true, "revokedAt": now },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_family_and_principal() {
        let repo = RefreshTokenRepository::new(Arc::new(InMemoryStore::new()));
        let (raw, first) = RefreshToken::issue("U1", Duration::days(1));
        let (_, sibling) = RefreshToken::issue_in_family("U1", &first.token_family, Duration::days(1));
        let (_, other) = RefreshToken::issue("U1", Duration::days(1));
        for t in [&first, &sibling, &other] {
            repo.insert(t).await.unwrap();
        }

        let found = repo.find_by_hash(&RefreshToken::hash_token(&raw)).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);

        assert_eq!(repo.revoke_family(&first.token_family).await.unwrap(), 2);
        assert_eq!(repo.find_active_by_principal("U1").await.unwrap().len(), 1);

        assert_eq!(repo.revoke_all_for_principal("U1").await.unwrap(), 1);
        assert!(repo.find_active_by_principal("U1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_claim_rotation_succeeds_once() {
        let repo = RefreshTokenRepository::new(Arc::new(InMemoryStore::new()));
        let (raw, token) = RefreshToken::issue("U1", Duration::days(1));
        repo.insert(&token).await.unwrap();
        let hash = RefreshToken::hash_token(&raw);

        assert!(repo.claim_rotation(&hash, "next-1").await.unwrap());
        assert!(!repo.claim_rotation(&hash, "next-2").await.unwrap());

        let stored = repo.find_by_hash(&hash).await.unwrap().unwrap();
        assert!(stored.revoked);
        assert_eq!(stored.replaced_by.as_deref(), Some("next-1"));
    }
}
