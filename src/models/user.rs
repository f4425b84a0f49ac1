// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_blank;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email, used as the login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    pub bio: Option<String>,

    pub profile_picture: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Public part of a user returned by auth endpoints.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The current user's profile, including associated skill names.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub skills: Vec<String>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ), custom(function = validate_not_blank))]
    pub name: String,
    #[validate(custom(function = validate_email, message = "Invalid email format"))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Insert payload for a user. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Partial profile update. Only present fields are applied.
/// `skill_ids` replaces the whole skill set when present.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfilePatch {
    #[validate(length(min = 1, max = 100), custom(function = validate_not_blank))]
    pub name: Option<String>,
    #[validate(custom(function = validate_email, message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(custom(function = validate_picture_url))]
    pub profile_picture: Option<String>,
    pub skill_ids: Option<Vec<i64>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.bio.is_none()
            && self.profile_picture.is_none()
            && self.skill_ids.is_none()
    }
}

pub fn validate_email(email: &str) -> Result<(), validator::ValidationError> {
    if email.len() <= 254 && EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_email"))
    }
}

fn validate_picture_url(url: &str) -> Result<(), validator::ValidationError> {
    if url::Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("ada example@x.io").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_patch_validation() {
        let patch = ProfilePatch {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = ProfilePatch {
            profile_picture: Some("https://cdn.example.com/a.png".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.is_empty());
        assert!(ProfilePatch::default().is_empty());
    }
}
