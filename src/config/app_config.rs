use std::path::PathBuf;

use reqwest::Url;
use serde::Deserialize;

use crate::domain::DomainError;

pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the Supabase project
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Where the provider sends the browser after Google consent
    pub redirect_to: String,
    /// Persist the session here; in-memory only when unset
    pub session_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
    /// How often auth-state listeners re-read the session store to pick up
    /// changes made by other processes
    pub session_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            redirect_to: "http://localhost:3000/auth/callback".to_string(),
            session_file: None,
            request_timeout_secs: 30,
            session_poll_interval_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            ..Self::default()
        }
    }

    pub fn with_redirect_to(mut self, redirect_to: impl Into<String>) -> Self {
        self.redirect_to = redirect_to.into();
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    pub fn with_session_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.session_poll_interval_ms = interval_ms;
        self
    }

    /// Check the required keys are present and well-formed
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.url.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Missing {}",
                SUPABASE_URL_VAR
            )));
        }

        Url::parse(&self.url).map_err(|e| {
            DomainError::configuration(format!("Invalid {}: {}", SUPABASE_URL_VAR, e))
        })?;

        if self.anon_key.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Missing {}",
                SUPABASE_ANON_KEY_VAR
            )));
        }

        if self.session_poll_interval_ms == 0 {
            return Err(DomainError::configuration(
                "session_poll_interval_ms must be greater than zero",
            ));
        }

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from `config/default`, `config/local`, `APP__*`
    /// variables and finally the plain `SUPABASE_URL` / `SUPABASE_ANON_KEY`
    /// variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("supabase.url", non_empty_var(SUPABASE_URL_VAR))?
            .set_override_option("supabase.anon_key", non_empty_var(SUPABASE_ANON_KEY_VAR))?
            .build()?;

        config.try_deserialize()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
