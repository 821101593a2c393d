//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use shortlink_client::application::OutputFormat;

/// Shortlink - shorten URLs as a guest or with your account.
#[derive(Parser, Debug)]
#[command(name = "shortlink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Base URL of the shortening service (overrides the config file).
    #[arg(long, env = "SHORTLINK_API_BASE_URL")]
    pub api_url: Option<String>,

    /// Data directory holding config.toml and the session database.
    #[arg(long, env = "SHORTLINK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Shorten a URL (as your account when logged in).
    Shorten {
        /// Absolute http(s) URL to shorten.
        url: String,

        /// Copy the short URL to the terminal clipboard.
        #[arg(short, long)]
        copy: bool,
    },

    /// Log in and keep the session for later commands.
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHORTLINK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in.
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHORTLINK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// List the links you have created.
    History {
        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Change the slug of one of your links.
    Edit {
        /// Link id (see `history --format json`).
        id: String,

        /// New slug.
        slug: String,
    },

    /// Interactive session: shorten, copy, edit and watch login changes.
    Interactive,

    /// Show the effective configuration.
    Config {
        /// Write the effective configuration (including overrides) to disk.
        #[arg(long)]
        save: bool,
    },
}

impl Commands {
    /// Parse the history output format argument.
    pub fn history_format(format: &str) -> Result<OutputFormat, String> {
        format.parse()
    }
}
