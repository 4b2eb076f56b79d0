//! Supabase infrastructure module
//!
//! Concrete `AuthRepository` over a Supabase project: the auth (GoTrue) and
//! REST (PostgREST) HTTP client, PKCE helpers, and session persistence.

mod client;
mod pkce;
mod repository;
mod session;

pub use client::{ApiError, Profile, SupabaseClient, NO_ROWS_CODE, PROVIDER};
pub use pkce::{challenge_for, PkcePair};
pub use repository::{AuthChangeEvent, SupabaseAuthRepository};
pub use session::{
    FileSessionStore, InMemorySessionStore, ProviderUser, Session, SessionStore, StoredAuthState,
};
