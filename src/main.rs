//! Shortlink - command-line client for a URL shortening service.
//!
//! Every invocation is one execution context over the session persisted in
//! the data directory; logging in from one terminal is visible to the next.
//!
//!   shortlink shorten https://example.com/very/long/path --copy
//!   shortlink login -e you@example.com -p 'secret1!'
//!   shortlink history
//!   shortlink interactive

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use shortlink_client::application::{
    format_failure, format_history_json, format_history_table, format_link, format_status,
    Completion, OutputFormat, SessionStore, ShortenerClient, DEFAULT_EXTERNAL_POLL,
};
use shortlink_client::domain::{self, AppConfig, AppError, OperationState};
use shortlink_client::infrastructure::{
    config_file_path, ensure_config_exists, load_config, save_config, HttpShortenerApi,
    LocalStorage, Osc52Clipboard,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Main application logic. `Ok(false)` means the operation failed and the
/// failure was already shown.
async fn run(cli: Cli) -> domain::Result<bool> {
    let config_path = config_file_path(cli.data_dir.as_deref());
    let config = effective_config(&cli, &config_path)?;

    if let Commands::Config { save } = cli.command {
        return cmd_config(&config, &config_path, save);
    }

    let client = build_client(&config)?;

    match cli.command {
        Commands::Shorten { url, copy } => cmd_shorten(&client, &url, copy).await,
        Commands::Login { email, password } => {
            Ok(report(client.login(&email, &password).await)
                .map(|session| println!("Login successful! Welcome {}", session.user.email))
                .is_some())
        }
        Commands::Signup { email, password } => {
            Ok(report(client.register(&email, &password).await)
                .map(|session| println!("Account created! Welcome {}", session.user.email))
                .is_some())
        }
        Commands::Logout => {
            client.logout()?;
            println!("Logged out");
            Ok(true)
        }
        Commands::Whoami => {
            cmd_whoami(&client);
            Ok(true)
        }
        Commands::History { format } => {
            let format =
                Commands::history_format(&format).map_err(|message| AppError::Config { message })?;
            cmd_history(&client, format).await
        }
        Commands::Edit { id, slug } => {
            let session = client.session();
            let done = client
                .orchestrator()
                .edit_slug(&id, &slug, session.as_ref())
                .await;
            Ok(report(done).map(|link| println!("{}", format_link(&link))).is_some())
        }
        Commands::Interactive => cmd_interactive(&client).await,
        Commands::Config { .. } => Ok(true),
    }
}

/// Config file values with command-line overrides applied.
fn effective_config(cli: &Cli, config_path: &Path) -> domain::Result<AppConfig> {
    let mut config = load_config(config_path)?;

    if let Some(dir) = &cli.data_dir {
        config.paths.data_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.api_url {
        config.api.base_url.clone_from(url);
    }

    Ok(config)
}

fn build_client(config: &AppConfig) -> domain::Result<ShortenerClient> {
    let api = HttpShortenerApi::new(&config.api.base_url, config.request_timeout())?;
    let storage = LocalStorage::open(&config.session_db_path())?;

    tracing::debug!(base_url = %config.api.base_url, "Client configured");

    Ok(ShortenerClient::new(
        Arc::new(api),
        SessionStore::new(Arc::new(storage)),
        Arc::new(Osc52Clipboard),
        config.copy_feedback(),
    ))
}

/// Print a failure inline and hand back the success value, if any.
fn report<T>(completion: Completion<T>) -> Option<T> {
    match completion {
        Completion::Applied(OperationState::Success(value)) => Some(value),
        Completion::Applied(OperationState::Failure(info)) => {
            eprintln!("{}", format_failure(&info));
            None
        }
        Completion::Applied(OperationState::Idle | OperationState::Pending)
        | Completion::Superseded => None,
    }
}

/// Shorten command.
async fn cmd_shorten(client: &ShortenerClient, url: &str, copy: bool) -> domain::Result<bool> {
    let Some(link) = report(client.submit(url).await) else {
        return Ok(false);
    };

    println!("{}", format_link(&link));
    if copy && client.copy()? {
        println!("{}", "Copied!".green());
    }

    Ok(true)
}

/// Show the current identity.
fn cmd_whoami(client: &ShortenerClient) {
    println!("Welcome {}!", client.greeting().bold());
    match client.session() {
        Some(session) => println!("Logged in as {}", session.user.email.cyan()),
        None => println!("Not logged in"),
    }
}

/// History command.
async fn cmd_history(client: &ShortenerClient, format: OutputFormat) -> domain::Result<bool> {
    let Some(links) = report(client.history().await) else {
        return Ok(false);
    };

    let output = match format {
        OutputFormat::Table => format_history_table(&links),
        OutputFormat::Json => format_history_json(&links).map_err(AppError::json_parse)?,
    };
    println!("{output}");

    Ok(true)
}

/// Config command.
fn cmd_config(config: &AppConfig, config_path: &Path, save: bool) -> domain::Result<bool> {
    if save {
        save_config(config, config_path)?;
        println!("{} Saved {}", "✓".green().bold(), config_path.display());
    } else {
        ensure_config_exists(config_path)?;
    }

    let rendered = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;
    println!("{rendered}");

    Ok(true)
}

const INTERACTIVE_HELP: &str = "Commands:
  shorten <url>            shorten a URL
  copy                     copy the current short link
  edit                     open the slug editor (logged in only)
  slug <value>             type a new slug
  save                     submit the typed slug
  cancel                   close the slug editor
  history                  list your links
  login <email> <password> log in
  logout                   log out
  status                   show link, copy and editor state
  quit                     leave";

/// Interactive session over stdin.
async fn cmd_interactive(client: &ShortenerClient) -> domain::Result<bool> {
    println!("Welcome {}!", client.greeting().bold());
    println!("{INTERACTIVE_HELP}");

    let _session_changes = client.session_store().subscribe(|session| match session {
        Some(session) => println!("» Signed in as {}", session.user.email),
        None => println!("» Signed out"),
    });
    let _other_terminals = client.session_store().watch_external(DEFAULT_EXTERNAL_POLL);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AppError::io("Failed to read input", e))?
    {
        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (None, ..) => {}
            (Some("shorten"), Some(url), _) => {
                if let Some(link) = report(client.submit(url).await) {
                    println!("{}", format_link(&link));
                }
            }
            (Some("copy"), ..) => {
                if client.copy()? {
                    println!("{}", "Copied!".green());
                } else {
                    println!("Nothing to copy yet");
                }
            }
            (Some("edit"), ..) => {
                if client.open_edit() {
                    println!("Editing slug: {}", client.transient().editable_slug());
                } else {
                    println!("Log in and shorten a link first");
                }
            }
            (Some("slug"), Some(slug), _) => client.set_editable_slug(slug),
            (Some("save"), ..) => match client.save_slug().await {
                Some(done) => {
                    if let Some(link) = report(done) {
                        println!("Short link updated! {}", link.short_url.cyan());
                    }
                }
                None => println!("Open the editor with `edit` first"),
            },
            (Some("cancel"), ..) => client.close_edit(),
            (Some("history"), ..) => {
                if let Some(links) = report(client.history().await) {
                    println!("{}", format_history_table(&links));
                }
            }
            (Some("login"), Some(email), Some(password)) => {
                report(client.login(email, password).await);
            }
            (Some("logout"), ..) => client.logout()?,
            (Some("status"), ..) => println!("{}", format_status(&client.transient().view())),
            (Some("help"), ..) => println!("{INTERACTIVE_HELP}"),
            (Some("quit" | "exit"), ..) => break,
            _ => println!("Unknown command. Type `help`."),
        }
    }

    Ok(true)
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
