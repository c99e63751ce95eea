//! User-facing error notifications.

use tracing::error;

/// Shown when the server rejects a request without a message of its own
pub const REQUEST_FAILED: &str = "Request failed";

/// Shown when no response was received at all
pub const NETWORK_ERROR: &str = "Network error";

pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Default notifier: reports through the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        error!(target: "collabu::notify", "{}", message);
    }
}
