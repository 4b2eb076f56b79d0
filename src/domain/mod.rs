//! Domain layer - Core business logic and entities

pub mod auth;
pub mod error;

pub use auth::{
    AuthError, AuthOperation, AuthRepository, AuthStateListener, GetCurrentUser,
    GetCurrentUserResponse, OAuthRedirect, SignInWithGoogle, SignInWithGoogleResponse, SignOut,
    SignOutResponse, Subscription, User, UserValidationError,
};
pub use error::DomainError;
