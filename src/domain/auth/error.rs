use std::fmt;

use thiserror::Error;

use crate::domain::DomainError;

/// The use-case an [`AuthError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    GetCurrentUser,
    SignInWithGoogle,
    SignOut,
}

impl fmt::Display for AuthOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetCurrentUser => write!(f, "get_current_user"),
            Self::SignInWithGoogle => write!(f, "sign_in_with_google"),
            Self::SignOut => write!(f, "sign_out"),
        }
    }
}

/// Errors surfaced by the auth use-cases
///
/// Each variant prefixes the underlying failure with a stable,
/// operation-specific message callers can branch on.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to get current user: {0}")]
    GetCurrentUser(#[source] DomainError),

    #[error("Google sign-in failed: {0}")]
    SignInWithGoogle(#[source] DomainError),

    #[error("Sign-out failed: {0}")]
    SignOut(#[source] DomainError),
}

impl AuthError {
    pub fn operation(&self) -> AuthOperation {
        match self {
            Self::GetCurrentUser(_) => AuthOperation::GetCurrentUser,
            Self::SignInWithGoogle(_) => AuthOperation::SignInWithGoogle,
            Self::SignOut(_) => AuthOperation::SignOut,
        }
    }

    pub fn cause(&self) -> &DomainError {
        match self {
            Self::GetCurrentUser(e) | Self::SignInWithGoogle(e) | Self::SignOut(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_prefixes() {
        let error = AuthError::GetCurrentUser(DomainError::provider("test", "boom"));
        assert_eq!(error.to_string(), "Failed to get current user: boom");

        let error = AuthError::SignInWithGoogle(DomainError::provider("test", "boom"));
        assert_eq!(error.to_string(), "Google sign-in failed: boom");

        let error = AuthError::SignOut(DomainError::provider("test", "boom"));
        assert_eq!(error.to_string(), "Sign-out failed: boom");
    }

    #[test]
    fn test_unknown_cause() {
        let error = AuthError::SignOut(DomainError::unknown(None));
        assert_eq!(error.to_string(), "Sign-out failed: Unknown error");
    }

    #[test]
    fn test_operation_and_source() {
        let error = AuthError::SignOut(DomainError::storage("disk full"));

        assert_eq!(error.operation(), AuthOperation::SignOut);
        assert!(matches!(error.cause(), DomainError::Storage { .. }));
        assert_eq!(
            error.source().map(|s| s.to_string()),
            Some("Storage error: disk full".to_string())
        );
    }
}
