//! Session and authentication core for the collabu client.
//!
//! The [`auth::CredentialStore`] owns the bearer token and user profile.
//! The [`api::ApiClient`] sends every request through a pipeline that
//! attaches the token and, when the server rejects it, clears the store and
//! sends the application back to the login page.

pub mod api;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod navigation;
pub mod notify;
pub mod storage;

pub use api::{ApiClient, ApiError, ApiResponse, FailureKind};
pub use auth::{CredentialStore, SessionState, UserProfile};
pub use config::Config;
pub use cookies::SessionCookieJar;
pub use navigation::{Location, Navigator};
pub use notify::{Notifier, TracingNotifier};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
