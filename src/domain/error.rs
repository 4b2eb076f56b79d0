use thiserror::Error;

use super::auth::UserValidationError;

/// Core domain errors
///
/// Every `AuthRepository` implementation reports failures through this type.
/// Display strings carry the root cause only; the use-cases add their own
/// operation prefix on top.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    InvalidUser(#[from] UserValidationError),

    #[error("Invalid sign-in response: {message}")]
    InvalidResponse { message: String },

    #[error("{message}")]
    Provider { provider: String, message: String },

    /// An OAuth callback arrived with no sign-in waiting for it
    #[error("No pending sign-in to complete; start a new Google sign-in first")]
    NoPendingSignIn,

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Failure reported without any message. `detail` keeps whatever raw
    /// payload was available so it can still be logged.
    #[error("Unknown error")]
    Unknown { detail: Option<String> },
}

impl DomainError {
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unknown(detail: Option<String>) -> Self {
        Self::Unknown { detail }
    }
}
