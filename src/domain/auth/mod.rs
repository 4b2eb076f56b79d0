//! Auth domain
//!
//! This module provides the user entity, the capability trait an identity
//! provider must implement, and the use-cases built on top of it.

mod entity;
mod error;
mod repository;
mod subscription;
mod use_cases;
mod validation;

pub use entity::{User, UserProps};
pub use error::{AuthError, AuthOperation};
pub use repository::{AuthRepository, OAuthRedirect};
pub use subscription::{AuthStateListener, Subscription};
pub use use_cases::{
    GetCurrentUser, GetCurrentUserResponse, SignInWithGoogle, SignInWithGoogleResponse, SignOut,
    SignOutResponse,
};
pub use validation::{
    validate_avatar_url, validate_email, validate_user_id, validate_username, UserValidationError,
};

#[cfg(test)]
pub use repository::MockAuthRepository;
