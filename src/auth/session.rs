//! Session state derived from the local store.
//!
//! The authenticated flag is computed once at construction from token
//! presence and afterwards changes only through `login` and `logout`.
//! No client-side expiry validation is performed; a rejected token
//! surfaces as a 401 on the next call.

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::store::{LocalStore, TOKEN_KEY};

#[derive(Debug)]
pub struct SessionState {
    store: LocalStore,
    authenticated: bool,
    epoch: u64,
}

impl SessionState {
    /// Build session state over the store. Token presence is the sole
    /// predicate for the initial authenticated flag.
    pub fn new(store: LocalStore) -> Self {
        let authenticated = store.contains(TOKEN_KEY);
        debug!(authenticated, "Session state initialized");
        Self {
            store,
            authenticated,
            epoch: 0,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn token(&self) -> Option<String> {
        self.store.get_string(TOKEN_KEY)
    }

    /// Monotonic counter identifying the current session. Bumped by
    /// both `login` and `logout`; background results carry the epoch
    /// they were issued under and are dropped on mismatch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Store the token and mark the session authenticated. Navigation
    /// after login is the caller's responsibility.
    pub fn login(&mut self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, Value::String(token.to_string()))?;
        self.authenticated = true;
        self.epoch += 1;
        info!("Session established");
        Ok(())
    }

    /// Clear the token and every cached session key, and mark the
    /// session unauthenticated.
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.authenticated = false;
        self.epoch += 1;
        info!("Session cleared");
        Ok(())
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LocalStore {
        &mut self.store
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContextError {
    #[error("session read outside an installed auth context")]
    MissingProvider,
}

/// Read access to the session, handed to view code by the composition
/// root. A detached context (no provider installed) is a programmer
/// error: reads return a hard error, never a default.
pub struct AuthContext<'a> {
    session: Option<&'a SessionState>,
}

impl<'a> AuthContext<'a> {
    pub fn installed(session: &'a SessionState) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn detached() -> Self {
        Self { session: None }
    }

    pub fn session(&self) -> Result<&'a SessionState, ContextError> {
        self.session.ok_or(ContextError::MissingProvider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::tests::scratch_dir;
    use crate::auth::store::{PERMISSIONS_KEY, USER_KEY};

    #[test]
    fn test_token_present_starts_authenticated() {
        let dir = scratch_dir("session-present");
        let mut seed = LocalStore::open(dir.clone());
        seed.set(TOKEN_KEY, Value::String("tok".into())).unwrap();

        let session = SessionState::new(LocalStore::open(dir));
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_token_absent_starts_unauthenticated() {
        let dir = scratch_dir("session-absent");
        let session = SessionState::new(LocalStore::open(dir));
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_login_stores_token_and_flips_flag() {
        let dir = scratch_dir("session-login");
        let mut session = SessionState::new(LocalStore::open(dir.clone()));
        session.login("abc123").expect("Login failed");

        assert!(session.is_authenticated());
        // Token lives in the store under the fixed key
        let reopened = LocalStore::open(dir);
        assert_eq!(reopened.get_string(TOKEN_KEY).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_login_then_logout_ends_unauthenticated() {
        let dir = scratch_dir("session-logout");
        let mut session = SessionState::new(LocalStore::open(dir.clone()));
        session.login("abc123").unwrap();
        session
            .store_mut()
            .set(USER_KEY, serde_json::json!({"id": 1}))
            .unwrap();
        session
            .store_mut()
            .set(PERMISSIONS_KEY, serde_json::json!(["reports:read"]))
            .unwrap();

        session.logout().expect("Logout failed");
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());

        // Every cached key is gone, not just the token
        let reopened = LocalStore::open(dir);
        assert!(!reopened.contains(TOKEN_KEY));
        assert!(!reopened.contains(USER_KEY));
        assert!(!reopened.contains(PERMISSIONS_KEY));
    }

    #[test]
    fn test_epoch_bumped_by_login_and_logout() {
        let dir = scratch_dir("session-epoch");
        let mut session = SessionState::new(LocalStore::open(dir));
        let boot = session.epoch();
        session.login("t1").unwrap();
        assert_eq!(session.epoch(), boot + 1);
        session.logout().unwrap();
        assert_eq!(session.epoch(), boot + 2);
    }

    #[test]
    fn test_detached_context_read_errors() {
        let ctx = AuthContext::detached();
        assert_eq!(ctx.session().unwrap_err(), ContextError::MissingProvider);
    }

    #[test]
    fn test_installed_context_reads_session() {
        let dir = scratch_dir("session-ctx");
        let session = SessionState::new(LocalStore::open(dir));
        let ctx = AuthContext::installed(&session);
        assert!(!ctx
            .session()
            .expect("Context read failed")
            .is_authenticated());
    }
}
