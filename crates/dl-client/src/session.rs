//! Session state shared by clones of a `Client`.
//!
//! Every installed token pair gets a new generation number. A request
//! remembers the generation of the token it sent; on a 401 the refresh
//! path compares it with the current one to tell "my token is stale"
//! from "someone already refreshed".

use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::models::{SessionUser, TokenResponse};

/// Token pair as seen by one request.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct State {
    current: Option<SessionSnapshot>,
    /// Last generation handed out, kept across logouts
    generation: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    state: RwLock<State>,
    /// Held for the whole refresh exchange so only one runs at a time
    refresh_gate: Mutex<()>,
}

impl SessionStore {
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.read().await.current.clone()
    }

    /// Install a fresh token pair under a new generation.
    pub async fn install(&self, tokens: TokenResponse) -> SessionSnapshot {
        let mut state = self.state.write().await;
        state.generation += 1;
        let snapshot = SessionSnapshot {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: tokens.user,
            generation: state.generation,
        };
        state.current = Some(snapshot.clone());
        snapshot
    }

    pub async fn clear(&self) {
        self.state.write().await.current = None;
    }

    pub async fn refresh_gate(&self) -> MutexGuard<'_, ()> {
        self.refresh_gate.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(access: &str) -> TokenResponse {
        TokenResponse {
            access_token: access.into(),
            refresh_token: format!("{}-refresh", access),
            token_type: "Bearer".into(),
            expires_in: 3600,
            user: SessionUser {
                id: "U1".into(),
                email: "ada@example.com".into(),
                display_name: "Ada".into(),
                role: "CUSTOMER".into(),
                customer_id: Some("C1".into()),
            },
        }
    }

    #[tokio::test]
    async fn test_generations_increase_across_clears() {
        let store = SessionStore::default();
        assert!(store.snapshot().await.is_none());

        let first = store.install(tokens("a")).await;
        store.clear().await;
        assert!(store.snapshot().await.is_none());

        let second = store.install(tokens("b")).await;
        assert!(second.generation > first.generation);
        assert_eq!(store.snapshot().await.unwrap().access_token, "b");
    }
}
