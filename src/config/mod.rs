mod app_config;

pub use app_config::{
    AppConfig, LogFormat, LoggingConfig, SupabaseConfig, SUPABASE_ANON_KEY_VAR, SUPABASE_URL_VAR,
};
