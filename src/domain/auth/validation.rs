//! User field validation

use thiserror::Error;
use validator::{ValidateEmail, ValidateUrl};

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("User ID cannot be empty")]
    EmptyId,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Invalid URL format")]
    InvalidAvatarUrl,
}

/// Validate a user ID
///
/// Any non-empty string is accepted; the identity provider owns the format.
pub fn validate_user_id(id: &str) -> Result<(), UserValidationError> {
    if id.is_empty() {
        return Err(UserValidationError::EmptyId);
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if !email.validate_email() {
        return Err(UserValidationError::InvalidEmail);
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), UserValidationError> {
    if username.is_empty() {
        return Err(UserValidationError::EmptyUsername);
    }

    Ok(())
}

/// Validate an avatar URL. An absent avatar is always valid.
pub fn validate_avatar_url(avatar_url: Option<&str>) -> Result<(), UserValidationError> {
    match avatar_url {
        Some(url) if !url.validate_url() => Err(UserValidationError::InvalidAvatarUrl),
        _ => Ok(()),
    }
}
