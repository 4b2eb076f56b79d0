//! User entity

use serde::{Deserialize, Serialize};

use super::validation::{
    validate_avatar_url, validate_email, validate_user_id, validate_username,
    UserValidationError,
};

/// Raw user fields, as supplied by a provider mapping or a serialized record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProps {
    pub id: String,
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Authenticated user
///
/// Fields are validated on construction and never change afterwards; a
/// changed identity is a new `User`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserProps", rename_all = "camelCase")]
pub struct User {
    id: String,
    email: String,
    username: String,
    avatar_url: Option<String>,
}

impl User {
    /// Create a new user, failing on the first invalid field
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        avatar_url: Option<String>,
    ) -> Result<Self, UserValidationError> {
        let id = id.into();
        let email = email.into();
        let username = username.into();

        validate_user_id(&id)?;
        validate_email(&email)?;
        validate_username(&username)?;
        validate_avatar_url(avatar_url.as_deref())?;

        Ok(Self {
            id,
            email,
            username,
            avatar_url,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }
}

impl TryFrom<UserProps> for User {
    type Error = UserValidationError;

    fn try_from(props: UserProps) -> Result<Self, Self::Error> {
        Self::new(props.id, props.email, props.username, props.avatar_url)
    }
}
