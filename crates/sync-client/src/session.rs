//! Durable session state for the sync client.
//!
//! The whole session (`{accessToken, refreshToken, user}`) lives in one
//! JSON slot of an injected [`SecretStore`], so a restart restores the
//! session without a network round trip and tests can swap in the in-memory
//! store.

use std::sync::Arc;

use budgetbook_core::secrets::SecretStore;

use crate::error::{Result, SyncClientError};
use crate::types::AuthSession;

const SESSION_SLOT: &str = "sync_session";

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SecretStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, session: &AuthSession) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        self.store
            .set_secret(SESSION_SLOT, &raw)
            .map_err(|e| SyncClientError::auth(e.to_string()))
    }

    pub fn load(&self) -> Result<Option<AuthSession>> {
        let raw = self
            .store
            .get_secret(SESSION_SLOT)
            .map_err(|e| SyncClientError::auth(e.to_string()))?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.map(|session| session.access_token))
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.and_then(|session| session.refresh_token))
    }

    /// Swap in tokens from a refresh. The user snapshot is kept; a missing
    /// refresh token in the response keeps the old one (the backend only
    /// rotates it sometimes).
    pub fn update_tokens(&self, access_token: String, refresh_token: Option<String>) -> Result<()> {
        let mut session = self
            .load()?
            .ok_or_else(|| SyncClientError::auth("no session to update"))?;
        session.access_token = access_token;
        if refresh_token.is_some() {
            session.refresh_token = refresh_token;
        }
        self.save(&session)
    }

    pub fn clear(&self) -> Result<()> {
        self.store
            .delete_secret(SESSION_SLOT)
            .map_err(|e| SyncClientError::auth(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetbook_core::secrets::MemorySecretStore;
    use serde_json::json;

    fn context() -> SessionContext {
        SessionContext::new(Arc::new(MemorySecretStore::default()))
    }

    #[test]
    fn session_round_trips_through_the_store() {
        let ctx = context();
        assert!(ctx.load().expect("empty load").is_none());

        let session = AuthSession {
            access_token: "acc".to_string(),
            refresh_token: Some("ref".to_string()),
            user: json!({"email": "a@b.co"}),
        };
        ctx.save(&session).expect("save");
        assert_eq!(ctx.load().expect("load"), Some(session));
        assert_eq!(ctx.access_token().expect("token"), Some("acc".to_string()));

        ctx.clear().expect("clear");
        assert!(ctx.load().expect("cleared").is_none());
    }

    #[test]
    fn refresh_without_rotation_keeps_old_refresh_token() {
        let ctx = context();
        ctx.save(&AuthSession {
            access_token: "old-acc".to_string(),
            refresh_token: Some("ref".to_string()),
            user: json!({}),
        })
        .expect("save");

        ctx.update_tokens("new-acc".to_string(), None)
            .expect("update");
        let session = ctx.load().expect("load").expect("present");
        assert_eq!(session.access_token, "new-acc");
        assert_eq!(session.refresh_token.as_deref(), Some("ref"));
    }

    #[test]
    fn updating_tokens_without_a_session_is_an_auth_error() {
        let err = context()
            .update_tokens("acc".to_string(), None)
            .expect_err("no session");
        assert!(matches!(err, SyncClientError::Auth(_)));
    }
}
