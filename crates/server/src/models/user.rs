use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub type UserId = i32;
const USER_NAME_LENGTH_LIMIT: usize = 255;
const USER_EMAIL_LENGTH_LIMIT: usize = 255;
const USER_AVATAR_LENGTH_LIMIT: usize = 2048;
const USER_PASSWORD_MIN_LENGTH: usize = 8;
const USER_PASSWORD_MAX_LENGTH: usize = 80;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user, never carries the password hash.
#[derive(Clone, Debug, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug)]
pub struct UpdateUser {
    pub user_id: UserId,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UpdateUserWithCreds {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfilePayload {
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentialsPayload {
    pub current_password: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Tells the browser where to navigate after an auth action.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RedirectResponse {
    pub redirect: String,
}

impl RedirectResponse {
    pub fn to(path: &str) -> Self {
        Self {
            redirect: path.to_string(),
        }
    }
}

pub fn validate_user_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().len() != name.len() {
        return Err(ValidationError::InvalidInput {
            value: name.to_string(),
            reason: "user name cannot be surrounded with whitespace characters".to_string(),
        });
    }
    if name.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: name.to_string(),
            reason: "user name cannot be empty".to_string(),
        });
    }
    if name.chars().count() > USER_NAME_LENGTH_LIMIT {
        return Err(ValidationError::InvalidInput {
            value: name.to_string(),
            reason: format!(
                "user name cannot be longer than {} chars",
                USER_NAME_LENGTH_LIMIT
            ),
        });
    }
    Ok(())
}

pub fn validate_user_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > USER_EMAIL_LENGTH_LIMIT || !crate::auth::utils::is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_user_avatar(avatar: Option<&str>) -> Result<(), ValidationError> {
    match avatar {
        Some(avatar) if avatar.len() > USER_AVATAR_LENGTH_LIMIT => {
            Err(ValidationError::LimitExceeded {
                subject: "avatar url".to_string(),
                unit: "byte".to_string(),
                attempted: avatar.len(),
                limit: USER_AVATAR_LENGTH_LIMIT,
            })
        }
        _ => Ok(()),
    }
}

pub fn validate_user_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < USER_PASSWORD_MIN_LENGTH || password.len() > USER_PASSWORD_MAX_LENGTH {
        return Err(ValidationError::InvalidInput {
            value: "<password>".to_string(),
            reason: format!(
                "password should be at least {} and at most {} characters long",
                USER_PASSWORD_MIN_LENGTH, USER_PASSWORD_MAX_LENGTH
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_with_padding_is_rejected() {
        assert!(validate_user_name(" Alice").is_err());
        assert!(validate_user_name("").is_err());
        assert!(validate_user_name("Alice Liddell").is_ok());
    }

    #[test]
    fn email_must_look_like_an_address() {
        assert!(validate_user_email("alice@example.com").is_ok());
        assert!(matches!(
            validate_user_email("alice.example.com"),
            Err(ValidationError::InvalidEmail)
        ));
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_user_password("short").is_err());
        assert!(validate_user_password("long enough").is_ok());
        assert!(validate_user_password(&"x".repeat(81)).is_err());
    }

    #[test]
    fn long_avatar_is_rejected() {
        assert!(validate_user_avatar(None).is_ok());
        assert!(validate_user_avatar(Some("https://example.com/a.png")).is_ok());
        let long = "a".repeat(USER_AVATAR_LENGTH_LIMIT + 1);
        assert!(matches!(
            validate_user_avatar(Some(&long)),
            Err(ValidationError::LimitExceeded { .. })
        ));
    }
}
