use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::auth::{AuthError, AuthRepository};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

/// End the current session
#[derive(Debug)]
pub struct SignOut<R: AuthRepository + ?Sized> {
    auth_repository: Arc<R>,
}

impl<R: AuthRepository + ?Sized> Clone for SignOut<R> {
    fn clone(&self) -> Self {
        Self {
            auth_repository: Arc::clone(&self.auth_repository),
        }
    }
}

impl<R: AuthRepository + ?Sized> SignOut<R> {
    pub fn new(auth_repository: Arc<R>) -> Self {
        Self { auth_repository }
    }

    pub async fn execute(&self) -> Result<SignOutResponse, AuthError> {
        debug!("Signing out");

        self.auth_repository.sign_out().await.map_err(|e| {
            warn!(error = ?e, "Sign-out failed");
            AuthError::SignOut(e)
        })?;

        info!("Signed out");
        Ok(SignOutResponse { success: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::MockAuthRepository;
    use crate::domain::DomainError;

    #[tokio::test]
    async fn test_returns_success_when_sign_out_completes() {
        let mut repository = MockAuthRepository::new();
        repository.expect_sign_out().times(1).returning(|| Ok(()));

        let use_case = SignOut::new(Arc::new(repository));
        let result = use_case.execute().await.unwrap();

        assert_eq!(result, SignOutResponse { success: true });
    }

    #[tokio::test]
    async fn test_prefixes_repository_failure() {
        let mut repository = MockAuthRepository::new();
        repository
            .expect_sign_out()
            .times(1)
            .returning(|| Err(DomainError::provider("test", "Session invalidation failed")));

        let use_case = SignOut::new(Arc::new(repository));
        let error = use_case.execute().await.unwrap_err();

        assert!(matches!(error, AuthError::SignOut(_)));
        assert_eq!(
            error.to_string(),
            "Sign-out failed: Session invalidation failed"
        );
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_swallowed() {
        let mut repository = MockAuthRepository::new();
        repository
            .expect_sign_out()
            .times(1)
            .returning(|| Err(DomainError::storage("session file is read-only")));

        let use_case = SignOut::new(Arc::new(repository));
        let error = use_case.execute().await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "Sign-out failed: Storage error: session file is read-only"
        );
    }
}
