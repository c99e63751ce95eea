//! Client-side mirror of cookies set by the collabu server.
//!
//! The server sets `access_token_cookie` alongside the bearer token. The jar
//! is handed to reqwest as its cookie provider so the cookie round-trips on
//! later requests, and the credential store removes it on logout.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use tracing::{debug, trace};

/// Session cookie written by the server, cleared together with the token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token_cookie";

/// Cookie jar for a single API origin.
#[derive(Debug, Default)]
pub struct SessionCookieJar {
    cookies: RwLock<BTreeMap<String, String>>,
}

impl SessionCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let cookies = self.cookies.read().unwrap_or_else(|e| e.into_inner());
        cookies.get(name).cloned()
    }

    /// Insert a cookie directly, as if the server had set it
    pub fn insert(&self, name: &str, value: &str) {
        let mut cookies = self.cookies.write().unwrap_or_else(|e| e.into_inner());
        cookies.insert(name.to_string(), value.to_string());
    }

    /// Remove a cookie, returning whether it was present
    pub fn remove(&self, name: &str) -> bool {
        let mut cookies = self.cookies.write().unwrap_or_else(|e| e.into_inner());
        cookies.remove(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        let cookies = self.cookies.read().unwrap_or_else(|e| e.into_inner());
        cookies.is_empty()
    }

    fn apply_set_cookie(&self, header: &str) {
        let cookie = match Cookie::parse(header) {
            Ok(cookie) => cookie,
            Err(e) => {
                trace!(error = %e, "Ignoring unparseable Set-Cookie header");
                return;
            }
        };

        if is_expired(&cookie, Utc::now()) {
            if self.remove(cookie.name()) {
                debug!(cookie = %cookie.name(), "Server expired cookie");
            }
        } else {
            debug!(cookie = %cookie.name(), "Server set cookie");
            self.insert(cookie.name(), cookie.value());
        }
    }
}

impl CookieStore for SessionCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {
        for header in cookie_headers {
            if let Ok(header) = header.to_str() {
                self.apply_set_cookie(header);
            }
        }
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        let cookies = self.cookies.read().unwrap_or_else(|e| e.into_inner());
        if cookies.is_empty() {
            return None;
        }
        let header = cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

/// Max-Age wins over Expires when both are present
fn is_expired(cookie: &Cookie<'_>, now: DateTime<Utc>) -> bool {
    if let Some(max_age) = cookie.max_age() {
        return max_age.is_zero() || max_age.is_negative();
    }
    cookie
        .expires_datetime()
        .map(|expires| expires.unix_timestamp() <= now.timestamp())
        .unwrap_or(false)
}
