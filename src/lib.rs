//! Supa Auth
//!
//! Google OAuth sign-in for a Supabase project:
//! - Domain use-cases for sign-in, sign-out and current-user lookup
//! - A capability trait decoupling them from the identity provider
//! - A Supabase implementation with PKCE, session refresh and profile join
//! - Auth-state change subscriptions

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod state;

pub use config::AppConfig;
pub use state::{AppState, AuthServices};

use std::sync::Arc;

use tracing::info;

use config::SupabaseConfig;
use infrastructure::supabase::{
    FileSessionStore, InMemorySessionStore, SessionStore, SupabaseAuthRepository,
};

/// Create the application state with the given configuration
///
/// Fails before any use-case runs when the Supabase settings are missing or
/// malformed.
pub fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = create_session_store(&config.supabase);

    let supabase = SupabaseAuthRepository::new(&config.supabase, store)?;
    let auth = AuthServices::new(Arc::new(supabase.clone()));

    Ok(AppState { auth, supabase })
}

fn create_session_store(config: &SupabaseConfig) -> Arc<dyn SessionStore> {
    match &config.session_file {
        Some(path) => {
            info!("Using session file: {}", path.display());
            Arc::new(FileSessionStore::new(path))
        }
        None => {
            info!("Using in-memory session store");
            Arc::new(InMemorySessionStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_app_state_fails_fast_without_url() {
        let error = create_app_state_with_config(&AppConfig::default())
            .err()
            .unwrap();

        assert_eq!(
            error.to_string(),
            "Configuration error: Missing SUPABASE_URL"
        );
    }

    #[test]
    fn test_create_app_state_with_valid_config() {
        let mut config = AppConfig::default();
        config.supabase = SupabaseConfig::new("https://xyz.supabase.co", "anon-key");

        assert!(create_app_state_with_config(&config).is_ok());
    }
}
