//! CLI module for Supa Auth
//!
//! Provides subcommands for driving the Google sign-in flow from a terminal:
//! - `sign-in`: print the Google authorize URL
//! - `callback`: finish sign-in with the code from the redirect
//! - `whoami`: show the signed-in user
//! - `sign-out`: end the session
//! - `watch`: print auth-state notifications until Ctrl+C

pub mod auth;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Session file used when neither the config nor `--session-file` sets one
const DEFAULT_SESSION_FILE: &str = ".supa-auth/session.json";

/// Supa Auth - Google sign-in for a Supabase project
#[derive(Parser)]
#[command(name = "supa-auth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Where to keep the session between invocations
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start Google sign-in and print the URL to open
    SignIn,

    /// Complete sign-in with the `code` query parameter from the redirect
    Callback(auth::CallbackArgs),

    /// Show the signed-in user
    Whoami(auth::WhoamiArgs),

    /// Sign out and revoke the session
    SignOut,

    /// Print the current auth state and every change until Ctrl+C
    Watch,
}

/// Load `.env`, configuration and logging, then dispatch the command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    if let Some(path) = cli.session_file {
        config.supabase.session_file = Some(path);
    }
    config
        .supabase
        .session_file
        .get_or_insert_with(|| PathBuf::from(DEFAULT_SESSION_FILE));

    let state = crate::create_app_state_with_config(&config)?;

    match cli.command {
        Command::SignIn => auth::sign_in(&state).await,
        Command::Callback(args) => auth::callback(&state, args).await,
        Command::Whoami(args) => auth::whoami(&state, args).await,
        Command::SignOut => auth::sign_out(&state).await,
        Command::Watch => auth::watch(&state).await,
    }
}
