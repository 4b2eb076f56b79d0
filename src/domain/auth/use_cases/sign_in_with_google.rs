use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::auth::{AuthError, AuthRepository, OAuthRedirect};
use crate::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInWithGoogleResponse {
    pub url: String,
}

/// Start a Google OAuth sign-in and hand back the URL to redirect to
#[derive(Debug)]
pub struct SignInWithGoogle<R: AuthRepository + ?Sized> {
    auth_repository: Arc<R>,
}

impl<R: AuthRepository + ?Sized> Clone for SignInWithGoogle<R> {
    fn clone(&self) -> Self {
        Self {
            auth_repository: Arc::clone(&self.auth_repository),
        }
    }
}

impl<R: AuthRepository + ?Sized> SignInWithGoogle<R> {
    pub fn new(auth_repository: Arc<R>) -> Self {
        Self { auth_repository }
    }

    pub async fn execute(&self) -> Result<SignInWithGoogleResponse, AuthError> {
        debug!("Starting Google sign-in");

        let url = self
            .auth_repository
            .sign_in_with_google()
            .await
            .and_then(redirect_url)
            .map_err(|e| {
                warn!(error = ?e, "Google sign-in failed");
                AuthError::SignInWithGoogle(e)
            })?;

        info!("Google sign-in initiated");
        Ok(SignInWithGoogleResponse { url })
    }
}

fn redirect_url(redirect: OAuthRedirect) -> Result<String, DomainError> {
    match redirect.url {
        Some(url) if !url.is_empty() => Ok(url),
        _ => Err(DomainError::invalid_response("missing or invalid URL")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::MockAuthRepository;

    fn use_case_returning(
        result: fn() -> Result<OAuthRedirect, DomainError>,
    ) -> SignInWithGoogle<MockAuthRepository> {
        let mut repository = MockAuthRepository::new();
        repository
            .expect_sign_in_with_google()
            .times(1)
            .returning(result);
        SignInWithGoogle::new(Arc::new(repository))
    }

    #[tokio::test]
    async fn test_returns_oauth_url() {
        let use_case = use_case_returning(|| {
            Ok(OAuthRedirect::new(
                "https://accounts.google.com/oauth/authorize?client_id=test",
            ))
        });

        let result = use_case.execute().await.unwrap();

        assert_eq!(
            result,
            SignInWithGoogleResponse {
                url: "https://accounts.google.com/oauth/authorize?client_id=test".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_rejects_missing_url() {
        let use_case = use_case_returning(|| Ok(OAuthRedirect { url: None }));

        let error = use_case.execute().await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "Google sign-in failed: Invalid sign-in response: missing or invalid URL"
        );
        assert!(matches!(
            error.cause(),
            DomainError::InvalidResponse { .. }
        ));
    }

    #[tokio::test]
    async fn test_rejects_empty_url() {
        let use_case = use_case_returning(|| Ok(OAuthRedirect::new("")));

        let error = use_case.execute().await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "Google sign-in failed: Invalid sign-in response: missing or invalid URL"
        );
    }

    #[tokio::test]
    async fn test_prefixes_repository_failure() {
        let use_case =
            use_case_returning(|| Err(DomainError::provider("test", "Network connection failed")));

        let error = use_case.execute().await.unwrap_err();

        assert!(matches!(error, AuthError::SignInWithGoogle(_)));
        assert_eq!(
            error.to_string(),
            "Google sign-in failed: Network connection failed"
        );
    }

    #[tokio::test]
    async fn test_unknown_failure() {
        let use_case = use_case_returning(|| Err(DomainError::unknown(None)));

        let error = use_case.execute().await.unwrap_err();

        assert_eq!(error.to_string(), "Google sign-in failed: Unknown error");
    }
}
