//! Auth use-cases
//!
//! Each use-case makes exactly one repository call, never retries, and
//! re-surfaces every failure as an [`AuthError`](super::AuthError).

mod get_current_user;
mod sign_in_with_google;
mod sign_out;

pub use get_current_user::{GetCurrentUser, GetCurrentUserResponse};
pub use sign_in_with_google::{SignInWithGoogle, SignInWithGoogleResponse};
pub use sign_out::{SignOut, SignOutResponse};
