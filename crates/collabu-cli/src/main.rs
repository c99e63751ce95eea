//! collabu - command line client for the collabu team workspace.
//!
//! Logs in against a collabu server, keeps the session on disk and makes
//! authenticated API calls with it.

mod console;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use collabu_core::navigation::{landing_path, LOGIN_PATH};
use collabu_core::{
    ApiClient, ApiError, Config, CredentialStore, FileStore, Notifier, SessionCookieJar,
    SessionState, TracingNotifier,
};
use console::{ConsoleNavigator, ConsoleNotifier};

// ============================================================================
// Constants
// ============================================================================

/// Directory for an additional log file, when set
const LOG_DIR_ENV: &str = "COLLABU_LOG_DIR";

/// Log file name inside `COLLABU_LOG_DIR`
const LOG_FILE: &str = "collabu.log";

#[derive(Parser)]
#[command(name = "collabu", version, about = "Command line client for the collabu team workspace")]
struct Cli {
    /// Server URL without the /api prefix
    #[arg(long, env = "COLLABU_SERVER_URL", global = true)]
    server: Option<String>,

    /// Send error notifications to the log instead of the terminal
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        /// Username or email (defaults to the last one used)
        username: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show who is logged in
    Status,
    /// Refresh the stored profile from the server
    Me,
    /// GET an API path and print the JSON response
    Get {
        /// Path below /api, e.g. /teams/42
        path: String,
    },
}

impl Command {
    /// The application path this command runs at
    fn location(&self) -> String {
        match self {
            Command::Login { .. } => LOGIN_PATH.to_string(),
            Command::Me => "/profile".to_string(),
            Command::Get { path } => format!("/{}", path.trim_start_matches('/')),
            Command::Logout | Command::Status => "/".to_string(),
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter);

    match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let log_guard = init_tracing();

    let mut config = Config::load()?;
    let server_url = cli
        .server
        .clone()
        .unwrap_or_else(|| config.server_url().to_string());

    let storage = Arc::new(FileStore::in_dir(&config.data_dir()?));
    let credentials = Arc::new(CredentialStore::open(
        storage,
        Arc::new(SessionCookieJar::new()),
    ));
    let notifier: Arc<dyn Notifier> = if cli.quiet {
        Arc::new(TracingNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    };
    let navigator = Arc::new(ConsoleNavigator::new(cli.command.location()));

    let client = ApiClient::new(&server_url, credentials, navigator, notifier)?;
    info!(server = %server_url, "collabu starting");

    let result = run(cli.command, &client, &mut config).await;

    if let Err(e) = result {
        // Pipeline failures have already been reported to the user
        let reported = e
            .downcast_ref::<ApiError>()
            .is_some_and(|api| api.kind().is_some());
        if !reported {
            eprintln!("Error: {:#}", e);
        }
        drop(log_guard);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Command, client: &ApiClient, config: &mut Config) -> Result<()> {
    match command {
        Command::Login { username } => login(client, config, username).await,
        Command::Logout => {
            client.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Status => status(client),
        Command::Me => {
            let user = client.me().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(())
        }
        Command::Get { path } => {
            let value: Value = client.get(&path).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    }
}

async fn login(client: &ApiClient, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt_username(config.last_username.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    client.login(&username, &password).await?;

    config.last_username = Some(username.clone());
    config.save()?;

    let name = client
        .credentials()
        .profile()
        .map(|p| p.display_name().to_string())
        .unwrap_or(username);
    println!("Logged in as {}.", name);
    Ok(())
}

fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => print!("Username [{}]: ", default),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let entered = line.trim();

    match (entered.is_empty(), default) {
        (false, _) => Ok(entered.to_string()),
        (true, Some(default)) => Ok(default.to_string()),
        (true, None) => Err(anyhow::anyhow!("A username is required")),
    }
}

fn status(client: &ApiClient) -> Result<()> {
    let credentials = client.credentials();
    let has_token = credentials.token()?.is_some();

    match credentials.state() {
        SessionState::Authenticated => {
            let name = credentials
                .profile()
                .map(|p| p.display_name().to_string())
                .unwrap_or_else(|| "unknown user".to_string());
            println!("Logged in as {} on {}", name, client.base_url());
        }
        SessionState::Anonymous => println!("Not logged in ({})", client.base_url()),
    }
    println!("Start page: {}", landing_path(has_token));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use collabu_core::Navigator;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_command_locations() {
        let cli = Cli::parse_from(["collabu", "login", "ada"]);
        assert_eq!(cli.command.location(), "/login");

        let cli = Cli::parse_from(["collabu", "get", "teams/42"]);
        assert_eq!(cli.command.location(), "/teams/42");

        let cli = Cli::parse_from(["collabu", "--server", "http://collabu.test", "status"]);
        assert_eq!(cli.server.as_deref(), Some("http://collabu.test"));
        assert_eq!(cli.command.location(), "/");
    }

    #[test]
    fn test_console_navigator_tracks_location() {
        let navigator = ConsoleNavigator::new("/teams/42");
        navigator.navigate(LOGIN_PATH);
        assert_eq!(navigator.current_path(), "/login");
    }
}
