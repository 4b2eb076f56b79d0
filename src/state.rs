//! Application state wiring the auth use-cases to one repository

use std::sync::Arc;

use crate::domain::{
    AuthRepository, AuthStateListener, GetCurrentUser, SignInWithGoogle, SignOut, Subscription,
};
use crate::infrastructure::supabase::SupabaseAuthRepository;

/// The three auth use-cases sharing one injected repository
#[derive(Clone)]
pub struct AuthServices {
    auth_repository: Arc<dyn AuthRepository>,
    pub get_current_user: GetCurrentUser<dyn AuthRepository>,
    pub sign_in_with_google: SignInWithGoogle<dyn AuthRepository>,
    pub sign_out: SignOut<dyn AuthRepository>,
}

impl AuthServices {
    pub fn new(auth_repository: Arc<dyn AuthRepository>) -> Self {
        Self {
            get_current_user: GetCurrentUser::new(Arc::clone(&auth_repository)),
            sign_in_with_google: SignInWithGoogle::new(Arc::clone(&auth_repository)),
            sign_out: SignOut::new(Arc::clone(&auth_repository)),
            auth_repository,
        }
    }

    /// Register a listener for auth-state changes on the underlying repository
    pub fn on_auth_state_change(&self, listener: AuthStateListener) -> Subscription {
        self.auth_repository.on_auth_state_change(listener)
    }
}

/// Everything the CLI needs: the use-cases plus the concrete repository for
/// provider-specific steps such as completing the OAuth callback
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthServices,
    pub supabase: SupabaseAuthRepository,
}
