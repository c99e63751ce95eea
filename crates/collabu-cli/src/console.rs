//! Terminal implementations of the core's navigation and notification
//! boundaries.

use collabu_core::navigation::{is_login_path, Location, Navigator};
use collabu_core::Notifier;

/// Prints notifications to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

/// Each command runs "at" an application path. Navigating away ends the
/// command's flow, so the user is told where to go next.
pub struct ConsoleNavigator {
    location: Location,
}

impl ConsoleNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            location: Location::new(path),
        }
    }
}

impl Navigator for ConsoleNavigator {
    fn current_path(&self) -> String {
        self.location.current_path()
    }

    fn navigate(&self, path: &str) {
        self.location.navigate(path);
        if is_login_path(path) {
            eprintln!("Your session has ended. Run `collabu login` to sign in again.");
        } else {
            eprintln!("Continue at {}", path);
        }
    }
}
