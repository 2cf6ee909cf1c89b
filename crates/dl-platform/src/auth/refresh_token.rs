//! Refresh Token Entity
//!
//! Only the SHA-256 hash of a token is stored; the raw value is handed to
//! the client once. Tokens rotate on every use and all tokens of one login
//! share a `token_family`.

use base64::Engine;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::shared::tsid::TsidGenerator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    #[serde(rename = "_id")]
    pub id: String,

    pub token_hash: String,

    /// User the token was issued to
    pub principal_id: String,

    pub token_family: String,

    /// Hash of the token issued in exchange for this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<String>,

    #[serde(default)]
    pub revoked: bool,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub revoked_at: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    /// New token in a fresh family. Returns the raw token and the entity.
    pub fn issue(principal_id: impl Into<String>, ttl: Duration) -> (String, Self) {
        let family = TsidGenerator::generate();
        Self::issue_in_family(principal_id, family, ttl)
    }

    /// New token continuing an existing rotation chain.
    pub fn issue_in_family(
        principal_id: impl Into<String>,
        family: impl Into<String>,
        ttl: Duration,
    ) -> (String, Self) {
        let raw = Self::generate_raw_token();
        let now = Utc::now();
        let token = Self {
            id: TsidGenerator::generate(),
            token_hash: Self::hash_token(&raw),
            principal_id: principal_id.into(),
            token_family: family.into(),
            replaced_by: None,
            revoked: false,
            revoked_at: None,
            created_at: now,
            expires_at: now + ttl,
        };
        (raw, token)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        !self.revoked && !self.is_expired()
    }

    /// A rotated token presented again signals reuse.
    pub fn was_replaced(&self) -> bool {
        self.replaced_by.is_some()
    }

    pub fn revoke(&mut self) {
        self.revoked = true;
        self.revoked_at = Some(Utc::now());
    }

    /// 32 random bytes, base64url without padding.
    pub fn generate_raw_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn hash_token(raw_token: &str) -> String {
        let hash = Sha256::digest(raw_token.as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue() {
        let (raw, token) = RefreshToken::issue("U1", Duration::days(30));
        assert_eq!(raw.len(), 43);
        assert_eq!(token.token_hash, RefreshToken::hash_token(&raw));
        assert!(token.is_valid());
        assert!(!token.was_replaced());
    }

    #[test]
    fn test_family_and_revocation() {
        let (_, first) = RefreshToken::issue("U1", Duration::days(1));
        let (_, mut second) = RefreshToken::issue_in_family("U1", &first.token_family, Duration::days(1));
        assert_eq!(first.token_family, second.token_family);

        second.revoke();
        assert!(!second.is_valid());
        assert!(second.revoked_at.is_some());
    }

    #[test]
    fn test_expired() {
        let (_, token) = RefreshToken::issue("U1", Duration::seconds(-1));
        assert!(token.is_expired());
        assert!(!token.is_valid());
    }
}
