//! Auth commands

use std::sync::Arc;

use clap::Args;
use tracing::info;

use crate::domain::{AuthStateListener, User};
use crate::state::AppState;

#[derive(Args, Clone)]
pub struct CallbackArgs {
    /// Authorization code from the OAuth redirect
    #[arg(long)]
    pub code: String,
}

#[derive(Args, Clone)]
pub struct WhoamiArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn sign_in(state: &AppState) -> anyhow::Result<()> {
    let response = state.auth.sign_in_with_google.execute().await?;

    println!("Open this URL to sign in with Google:");
    println!("{}", response.url);
    println!("Then run `supa-auth callback --code <code>` with the code from the redirect.");

    Ok(())
}

pub async fn callback(state: &AppState, args: CallbackArgs) -> anyhow::Result<()> {
    state.supabase.exchange_code_for_session(&args.code).await?;

    whoami(state, WhoamiArgs { json: false }).await
}

pub async fn whoami(state: &AppState, args: WhoamiArgs) -> anyhow::Result<()> {
    let response = state.auth.get_current_user.execute().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response.user {
        Some(user) => println!("{}", describe(&user)),
        None => println!("Not signed in"),
    }

    Ok(())
}

pub async fn sign_out(state: &AppState) -> anyhow::Result<()> {
    state.auth.sign_out.execute().await?;

    println!("Signed out");
    Ok(())
}

pub async fn watch(state: &AppState) -> anyhow::Result<()> {
    let listener: AuthStateListener = Arc::new(|user: Option<User>| match user {
        Some(user) => println!("signed in: {}", describe(&user)),
        None => println!("signed out"),
    });

    let subscription = state.auth.on_auth_state_change(listener);
    info!("Watching auth state, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    subscription.unsubscribe();

    Ok(())
}

fn describe(user: &User) -> String {
    format!("{} <{}> (id: {})", user.username(), user.email(), user.id())
}
