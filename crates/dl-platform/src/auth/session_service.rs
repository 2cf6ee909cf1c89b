//! Session Service
//!
//! Password login, refresh-token rotation and logout.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::auth_service::AuthService;
use super::password_service::PasswordService;
use super::refresh_token::RefreshToken;
use super::refresh_token_repository::RefreshTokenRepository;
use crate::shared::error::{PlatformError, Result};
use crate::user::{User, UserRepository};

/// Tokens handed to a client after login or refresh.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: User,
}

pub struct SessionService {
    auth_service: Arc<AuthService>,
    password_service: Arc<PasswordService>,
    users: Arc<UserRepository>,
    refresh_tokens: Arc<RefreshTokenRepository>,
}

impl SessionService {
    pub fn new(
        auth_service: Arc<AuthService>,
        password_service: Arc<PasswordService>,
        users: Arc<UserRepository>,
        refresh_tokens: Arc<RefreshTokenRepository>,
    ) -> Self {
        Self {
            auth_service,
            password_service,
            users,
            refresh_tokens,
        }
    }

    fn issue(&self, user: User, family: Option<&str>) -> Result<(SessionTokens, RefreshToken)> {
        let ttl = self.auth_service.refresh_token_expiry();
        let (raw, entity) = match family {
            Some(family) => RefreshToken::issue_in_family(&user.id, family, ttl),
            None => RefreshToken::issue(&user.id, ttl),
        };
        let access_token = self.auth_service.generate_access_token(&user)?;
        let tokens = SessionTokens {
            access_token,
            refresh_token: raw,
            expires_in: self.auth_service.access_token_expiry_secs(),
            user,
        };
        Ok((tokens, entity))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionTokens> {
        let Some(mut user) = self.users.find_by_email(email).await? else {
            info!("Login failed: unknown email");
            return Err(PlatformError::InvalidCredentials);
        };

        if !self.password_service.verify_password(password, &user.password_hash)? {
            info!(user_id = %user.id, "Login failed: wrong password");
            return Err(PlatformError::InvalidCredentials);
        }
        if !user.active {
            return Err(PlatformError::AccountDisabled);
        }

        let now = Utc::now();
        self.users.record_login(&user.id, now).await?;
        user.last_login_at = Some(now);

        let (tokens, refresh) = self.issue(user, None)?;
        self.refresh_tokens.insert(&refresh).await?;
        info!(user_id = %tokens.user.id, "User logged in");
        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair. The presented token is
    /// retired; presenting a retired token again revokes its whole family.
    pub async fn refresh(&self, raw_token: &str) -> Result<SessionTokens> {
        let hash = RefreshToken::hash_token(raw_token);
        let stored = self
            .refresh_tokens
            .find_by_hash(&hash)
            .await?
            .ok_or_else(|| PlatformError::InvalidToken { message: "Unknown refresh token".into() })?;

        if stored.was_replaced() {
            let revoked = self.refresh_tokens.revoke_family(&stored.token_family).await?;
            warn!(
                principal_id = %stored.principal_id,
                family = %stored.token_family,
                revoked,
                "Refresh token reuse detected, family revoked"
            );
            return Err(PlatformError::InvalidToken { message: "Refresh token reuse detected".into() });
        }
        if stored.revoked {
            return Err(PlatformError::InvalidToken { message: "Refresh token revoked".into() });
        }
        if stored.is_expired() {
            return Err(PlatformError::TokenExpired);
        }

        let user = match self.users.find_by_id(&stored.principal_id).await? {
            Some(user) if user.active => user,
            _ => {
                self.refresh_tokens.revoke_family(&stored.token_family).await?;
                return Err(PlatformError::AccountDisabled);
            }
        };

        let family = stored.token_family.clone();
        let (tokens, next) = self.issue(user, Some(&family))?;
        // Only one exchange may retire a token; the loser is a reuse.
        if !self.refresh_tokens.claim_rotation(&hash, &next.token_hash).await? {
            let revoked = self.refresh_tokens.revoke_family(&family).await?;
            warn!(
                principal_id = %stored.principal_id,
                family = %family,
                revoked,
                "Concurrent refresh token reuse detected, family revoked"
            );
            return Err(PlatformError::InvalidToken { message: "Refresh token reuse detected".into() });
        }
        self.refresh_tokens.insert(&next).await?;
        Ok(tokens)
    }

    /// Revoke the session behind `raw_token`, or every session of the
    /// principal when no token is given.
    pub async fn logout(&self, principal_id: &str, raw_token: Option<&str>) -> Result<u64> {
        match raw_token {
            Some(raw) => {
                let hash = RefreshToken::hash_token(raw);
                match self.refresh_tokens.find_by_hash(&hash).await? {
                    Some(token) if token.principal_id == principal_id => {
                        self.refresh_tokens.revoke_family(&token.token_family).await
                    }
                    Some(_) => Err(PlatformError::forbidden("Refresh token belongs to another user")),
                    None => Ok(0),
                }
            }
            None => self.revoke_all(principal_id).await,
        }
    }

    pub async fn revoke_all(&self, principal_id: &str) -> Result<u64> {
        self.refresh_tokens.revoke_all_for_principal(principal_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::auth_service::AuthConfig;
    use crate::auth::password_service::{Argon2Config, PasswordPolicy};
    use crate::store::{DocumentStore, InMemoryStore};
    use crate::user::UserRole;

    struct Fixture {
        sessions: SessionService,
        users: Arc<UserRepository>,
        user: User,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let passwords = Arc::new(PasswordService::new(Argon2Config::testing(), PasswordPolicy::default()).unwrap());
        let users = Arc::new(UserRepository::new(store.clone()));
        let auth = Arc::new(AuthService::new(AuthConfig {
            secret_key: "session-test".into(),
            ..Default::default()
        }));

        let user = User::new(
            "sam@dealer.test",
            "Sam",
            passwords.hash_password("password-1").unwrap(),
            UserRole::Sales,
        );
        users.save(&user).await.unwrap();

        let sessions = SessionService::new(
            auth,
            passwords,
            users.clone(),
            Arc::new(RefreshTokenRepository::new(store)),
        );
        Fixture { sessions, users, user }
    }

    #[tokio::test]
    async fn test_login_stamps_last_login() {
        let f = fixture().await;
        let tokens = f.sessions.login("SAM@dealer.test", "password-1").await.unwrap();
        assert_eq!(tokens.user.id, f.user.id);
        assert!(!tokens.access_token.is_empty());

        let stored = f.users.find_by_id(&f.user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_failures() {
        let f = fixture().await;
        assert!(matches!(
            f.sessions.login("sam@dealer.test", "nope-nope").await,
            Err(PlatformError::InvalidCredentials)
        ));
        assert!(matches!(
            f.sessions.login("nobody@dealer.test", "password-1").await,
            Err(PlatformError::InvalidCredentials)
        ));

        let mut user = f.user.clone();
        user.active = false;
        f.users.save(&user).await.unwrap();
        assert!(matches!(
            f.sessions.login("sam@dealer.test", "password-1").await,
            Err(PlatformError::AccountDisabled)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_detects_reuse() {
        let f = fixture().await;
        let first = f.sessions.login("sam@dealer.test", "password-1").await.unwrap();

        let second = f.sessions.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        // Replaying the retired token kills the whole family
        assert!(f.sessions.refresh(&first.refresh_token).await.is_err());
        assert!(f.sessions.refresh(&second.refresh_token).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_refresh_of_one_token_rotates_once() {
        let f = fixture().await;
        let first = f.sessions.login("sam@dealer.test", "password-1").await.unwrap();
        let sessions = Arc::new(f.sessions);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sessions = sessions.clone();
                let raw = first.refresh_token.clone();
                tokio::spawn(async move { sessions.refresh(&raw).await })
            })
            .collect();

        let mut rotated = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                rotated += 1;
            }
        }
        assert_eq!(rotated, 1);
    }

    #[tokio::test]
    async fn test_refresh_rejects_deactivated_user() {
        let f = fixture().await;
        let tokens = f.sessions.login("sam@dealer.test", "password-1").await.unwrap();

        let mut user = f.user.clone();
        user.active = false;
        f.users.save(&user).await.unwrap();

        assert!(matches!(
            f.sessions.refresh(&tokens.refresh_token).await,
            Err(PlatformError::AccountDisabled)
        ));
    }

    #[tokio::test]
    async fn test_logout_single_and_all() {
        let f = fixture().await;
        let a = f.sessions.login("sam@dealer.test", "password-1").await.unwrap();
        let b = f.sessions.login("sam@dealer.test", "password-1").await.unwrap();

        assert_eq!(f.sessions.logout(&f.user.id, Some(&a.refresh_token)).await.unwrap(), 1);
        assert!(f.sessions.refresh(&a.refresh_token).await.is_err());

        assert_eq!(f.sessions.logout(&f.user.id, None).await.unwrap(), 1);
        assert!(f.sessions.refresh(&b.refresh_token).await.is_err());
    }
}
