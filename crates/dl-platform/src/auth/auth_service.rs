//! Authentication Service
//!
//! HS256 JWT access token generation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::error::{PlatformError, Result};
use crate::shared::tsid::TsidGenerator;
use crate::user::User;

/// JWT Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,

    pub email: String,

    /// Display name
    pub name: String,

    /// Role code, e.g. `SALES`
    pub role: String,

    /// Linked customer for `CUSTOMER` accounts
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for HS256
    pub secret_key: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_secs: i64,
    pub refresh_token_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            issuer: "dealerline".to_string(),
            audience: "dealerline-api".to_string(),
            access_token_expiry_secs: 3600,
            refresh_token_expiry_secs: 86400 * 30,
        }
    }
}

pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        info!(issuer = %config.issuer, "AuthService initialized with HS256");

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn access_token_expiry_secs(&self) -> i64 {
        self.config.access_token_expiry_secs
    }

    pub fn refresh_token_expiry(&self) -> Duration {
        Duration::seconds(self.config.refresh_token_expiry_secs)
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.access_token_expiry_secs);

        let claims = AccessTokenClaims {
            sub: user.id.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: TsidGenerator::generate(),
            email: user.email.clone(),
            name: user.display_name.clone(),
            role: user.role.as_str().to_string(),
            customer_id: user.customer_id.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::internal(format!("Failed to encode JWT: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken { message: e.to_string() },
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserRole;

    fn service(expiry: i64) -> AuthService {
        AuthService::new(AuthConfig {
            secret_key: "test-secret".into(),
            access_token_expiry_secs: expiry,
            ..Default::default()
        })
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = service(3600);
        let mut user = User::new("cust@example.com", "Cust", "hash", UserRole::Customer);
        user.customer_id = Some("C1".into());

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, "CUSTOMER");
        assert_eq!(claims.customer_id.as_deref(), Some("C1"));
        assert_eq!(claims.aud, "dealerline-api");
    }

    #[test]
    fn test_expired_token() {
        // Beyond the default 60s leeway
        let service = service(-120);
        let user = User::new("a@example.com", "A", "hash", UserRole::Sales);
        let token = service.generate_access_token(&user).unwrap();
        assert!(matches!(service.validate_token(&token), Err(PlatformError::TokenExpired)));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let user = User::new("a@example.com", "A", "hash", UserRole::Sales);
        let token = service(3600).generate_access_token(&user).unwrap();

        let other = AuthService::new(AuthConfig {
            secret_key: "another-secret".into(),
            ..Default::default()
        });
        assert!(matches!(other.validate_token(&token), Err(PlatformError::InvalidToken { .. })));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
