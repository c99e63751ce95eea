//! Authentication module for the current user session.
//!
//! This module provides:
//! - `CredentialStore`: bearer token and user profile, persisted through a
//!   `KeyValueStore` and cleared together with the session cookie
//! - `SessionState`, `UserProfile`: views over what the store holds
//!
//! Tokens are opaque; there is no expiry tracking or renewal. A session
//! ends on explicit logout or when the server rejects the token.

pub mod credentials;
pub mod session;

pub use credentials::{CredentialStore, TOKEN_KEY, USER_KEY};
pub use session::{Registration, SessionState, UserProfile};
