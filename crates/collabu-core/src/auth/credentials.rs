use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cookies::{SessionCookieJar, ACCESS_TOKEN_COOKIE};
use crate::storage::{KeyValueStore, StorageError};

use super::session::{SessionState, UserProfile};

/// Storage key for the raw bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key for the serialized user profile
pub const USER_KEY: &str = "user";

/// The current bearer token and user profile.
///
/// The token is read from storage on every access. The user profile is
/// hydrated once in [`CredentialStore::open`] and then kept in memory,
/// with every change written through to storage.
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStore>,
    cookies: Arc<SessionCookieJar>,
    user: RwLock<Option<Value>>,
}

impl CredentialStore {
    /// Open the store, seeding the in-memory user from persistent storage.
    /// Missing, unreadable or malformed data all mean "no session".
    pub fn open(storage: Arc<dyn KeyValueStore>, cookies: Arc<SessionCookieJar>) -> Self {
        let user = Self::load_user(storage.as_ref());
        debug!(has_user = user.is_some(), "Credential store opened");
        Self {
            storage,
            cookies,
            user: RwLock::new(user),
        }
    }

    fn load_user(storage: &dyn KeyValueStore) -> Option<Value> {
        let raw = match storage.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user, starting without a session");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Null) => None,
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored user is malformed, starting without a session");
                None
            }
        }
    }

    /// The cookie jar the HTTP client should use
    pub fn cookies(&self) -> Arc<SessionCookieJar> {
        Arc::clone(&self.cookies)
    }

    /// Current bearer token, read from storage
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, token)
    }

    pub fn user(&self) -> Option<Value> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The stored user as a typed profile, if it has the expected shape
    pub fn profile(&self) -> Option<UserProfile> {
        self.user().and_then(|user| serde_json::from_value(user).ok())
    }

    /// Replace the current user. The profile is stored as-is.
    ///
    /// This does not require a token: registration flows may record a user
    /// before one exists. The in-memory user only changes once the write to
    /// storage succeeds.
    pub fn set_user(&self, profile: Value) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&profile)?;
        self.storage.set(USER_KEY, &serialized)?;
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = Some(profile);
        Ok(())
    }

    /// Clear the user, token and session cookie.
    ///
    /// Safe to call repeatedly and from concurrent requests. Every step is
    /// attempted; the first storage error is returned.
    pub fn logout(&self) -> Result<(), StorageError> {
        let had_user = self
            .user
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some();

        let user_result = self.storage.remove(USER_KEY);
        let token_result = self.storage.remove(TOKEN_KEY);
        let had_cookie = self.cookies.remove(ACCESS_TOKEN_COOKIE);

        if had_user || had_cookie {
            info!("Session cleared");
        }

        user_result.and(token_result)
    }

    pub fn state(&self) -> SessionState {
        let has_token = match self.token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read token");
                false
            }
        };
        SessionState::from_parts(has_token, self.user().is_some())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use serde_json::json;

    /// Reads succeed, writes fail as if the disk were full
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    fn memory_store() -> (Arc<MemoryStore>, CredentialStore) {
        let storage = Arc::new(MemoryStore::new());
        let store = CredentialStore::open(storage.clone(), Arc::new(SessionCookieJar::new()));
        (storage, store)
    }

    #[test]
    fn test_empty_storage_is_anonymous() {
        let (_, store) = memory_store();
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.user(), None);
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_token_is_read_from_storage_each_time() {
        let (storage, store) = memory_store();
        storage.set(TOKEN_KEY, "abc123").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("abc123"));

        storage.set(TOKEN_KEY, "rotated").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("rotated"));
    }

    #[test]
    fn test_set_user_without_token() {
        let (storage, store) = memory_store();
        store.set_user(json!({"id": 1, "username": "ada"})).unwrap();

        assert!(store.user().is_some());
        assert_eq!(store.token().unwrap(), None);
        assert!(storage.get(USER_KEY).unwrap().is_some());
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_failed_set_user_keeps_memory_and_storage_in_step() {
        let inner = MemoryStore::new();
        inner.set(USER_KEY, r#"{"id": 1, "username": "ada"}"#).unwrap();
        let store = CredentialStore::open(
            Arc::new(ReadOnlyStore(inner)),
            Arc::new(SessionCookieJar::new()),
        );

        let err = store.set_user(json!({"id": 2, "username": "grace"})).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(store.user(), Some(json!({"id": 1, "username": "ada"})));
    }

    #[test]
    fn test_failed_set_user_leaves_no_user() {
        let store = CredentialStore::open(
            Arc::new(ReadOnlyStore(MemoryStore::new())),
            Arc::new(SessionCookieJar::new()),
        );

        assert!(store.set_user(json!({"id": 1})).is_err());
        assert_eq!(store.user(), None);
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_login_then_logout() {
        let (storage, store) = memory_store();
        store.set_token("abc123").unwrap();
        store.set_user(json!({"id": 1, "username": "ada"})).unwrap();
        store.cookies().insert(ACCESS_TOKEN_COOKIE, "cookie");
        assert!(store.is_authenticated());

        store.logout().unwrap();

        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.user(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
        assert!(store.cookies().get(ACCESS_TOKEN_COOKIE).is_none());
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_logout_twice_is_idempotent() {
        let (storage, store) = memory_store();
        store.set_token("abc123").unwrap();
        store.set_user(json!({"id": 1})).unwrap();

        store.logout().unwrap();
        store.logout().unwrap();

        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.user(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_malformed_user_means_no_session() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(USER_KEY, "{broken").unwrap();
        let store = CredentialStore::open(storage, Arc::new(SessionCookieJar::new()));
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_null_user_means_no_session() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(USER_KEY, "null").unwrap();
        let store = CredentialStore::open(storage, Arc::new(SessionCookieJar::new()));
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_user_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let profile = json!({
            "id": 42,
            "username": "ada",
            "email": "ada@example.com",
            "student_id": "2024001",
            "nickname": null,
            "teams": [{"id": 3, "role": "owner"}]
        });

        let store = CredentialStore::open(
            Arc::new(FileStore::in_dir(dir.path())),
            Arc::new(SessionCookieJar::new()),
        );
        store.set_user(profile.clone()).unwrap();
        drop(store);

        let restarted = CredentialStore::open(
            Arc::new(FileStore::in_dir(dir.path())),
            Arc::new(SessionCookieJar::new()),
        );
        assert_eq!(restarted.user(), Some(profile));
        assert_eq!(restarted.profile().unwrap().username, "ada");
    }
}
