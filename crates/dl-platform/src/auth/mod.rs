//! Authentication: password hashing, JWT access tokens, rotating refresh
//! tokens and the session endpoints.

pub mod auth_api;
pub mod auth_service;
pub mod password_service;
pub mod refresh_token;
pub mod refresh_token_repository;
pub mod session_service;

pub use auth_api::{auth_router, AuthApiState};
pub use auth_service::{AccessTokenClaims, AuthConfig, AuthService};
pub use password_service::{Argon2Config, PasswordPolicy, PasswordService};
pub use refresh_token::RefreshToken;
pub use refresh_token_repository::RefreshTokenRepository;
pub use session_service::{SessionService, SessionTokens};
