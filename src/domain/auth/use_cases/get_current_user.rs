use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::auth::{AuthError, AuthRepository, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCurrentUserResponse {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

/// Look up the signed-in user
#[derive(Debug)]
pub struct GetCurrentUser<R: AuthRepository + ?Sized> {
    auth_repository: Arc<R>,
}

impl<R: AuthRepository + ?Sized> Clone for GetCurrentUser<R> {
    fn clone(&self) -> Self {
        Self {
            auth_repository: Arc::clone(&self.auth_repository),
        }
    }
}

impl<R: AuthRepository + ?Sized> GetCurrentUser<R> {
    pub fn new(auth_repository: Arc<R>) -> Self {
        Self { auth_repository }
    }

    pub async fn execute(&self) -> Result<GetCurrentUserResponse, AuthError> {
        debug!("Fetching current user");

        let user = self
            .auth_repository
            .get_current_user()
            .await
            .map_err(|e| {
                warn!(error = ?e, "Current user lookup failed");
                AuthError::GetCurrentUser(e)
            })?;

        Ok(GetCurrentUserResponse {
            is_authenticated: user.is_some(),
            user,
        })
    }
}
