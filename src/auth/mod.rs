//! Authentication and session-state management.
//!
//! This module provides:
//! - `LocalStore`: persistent key-value storage for the token and
//!   cached session data
//! - `SessionState` / `AuthContext`: the authenticated flag,
//!   login/logout, and fail-fast session access for views
//! - `CredentialStore`: OS-level credential storage via keyring

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::CredentialStore;
pub use session::{AuthContext, ContextError, SessionState};
pub use store::{LocalStore, AVATAR_KEY, PERMISSIONS_KEY, TOKEN_KEY, USER_KEY};
