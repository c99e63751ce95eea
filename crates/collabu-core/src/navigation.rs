//! Navigation boundary between the session core and the application.
//!
//! When the server rejects the session the API client sends the whole
//! application to the login entry point. The application decides what a
//! navigation means (a page load, a prompt, a screen change); the core only
//! needs to know where the application currently is.

use std::sync::RwLock;

use tracing::debug;

/// Login entry point
pub const LOGIN_PATH: &str = "/login";

/// Where an authenticated session lands
pub const TEAMS_PATH: &str = "/teams";

pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    /// Full navigation to `path`, replacing the current location
    fn navigate(&self, path: &str);
}

/// True for the login page and anything beneath it
pub fn is_login_path(path: &str) -> bool {
    path.starts_with(LOGIN_PATH)
}

/// Root redirect: teams when a token exists, otherwise login
pub fn landing_path(has_token: bool) -> &'static str {
    if has_token {
        TEAMS_PATH
    } else {
        LOGIN_PATH
    }
}

/// In-process location. Navigation takes effect immediately, so a second
/// auth failure after a redirect already sees the login path.
#[derive(Debug)]
pub struct Location {
    path: RwLock<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: RwLock::new(path.into()),
        }
    }
}

impl Navigator for Location {
    fn current_path(&self) -> String {
        self.path.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn navigate(&self, path: &str) {
        debug!(to = path, "Navigating");
        *self.path.write().unwrap_or_else(|e| e.into_inner()) = path.to_string();
    }
}
