//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{ROLE_ADMIN, ROLE_USER};

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::User => write!(f, "{}", ROLE_USER),
        }
    }
}

/// User domain entity. The username is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = active, Some = deleted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new user with default role
    pub fn new(username: String, password_hash: String, phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            username,
            password_hash,
            role: UserRole::User,
            phone,
            refresh_token: None,
            refresh_token_expires_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check if user is active (not deleted)
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Whether `token` matches the stored refresh token and has not expired.
    pub fn has_valid_refresh_token(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.refresh_token, self.refresh_token_expires_at) {
            (Some(stored), Some(expires_at)) => stored == token && expires_at > now,
            _ => false,
        }
    }

    /// Store a new refresh token
    pub fn set_refresh_token(&mut self, token: String, expires_at: DateTime<Utc>) {
        self.refresh_token = Some(token);
        self.refresh_token_expires_at = Some(expires_at);
        self.updated_at = Utc::now();
    }

    /// Soft delete the user and drop any refresh token
    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.deleted_at = Some(now);
        self.refresh_token = None;
        self.refresh_token_expires_at = None;
        self.updated_at = now;
    }
}

/// Data needed to insert a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
}

/// Profile changes requested by a caller. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    /// New phone number
    #[schema(example = "+1 555 0100")]
    pub phone: Option<String>,
    /// New role (admin only)
    #[schema(example = "admin")]
    pub role: Option<String>,
    /// New password (minimum 8 characters)
    pub password: Option<String>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Username (email address)
    #[schema(example = "user@example.com")]
    pub username: String,
    /// User role
    #[schema(example = "user")]
    pub role: String,
    /// Phone number
    pub phone: Option<String>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            role: user.role.to_string(),
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_role_round_trip_through_strings() {
        assert_eq!(UserRole::from("admin"), UserRole::Admin);
        assert_eq!(UserRole::from("user"), UserRole::User);
        assert_eq!(UserRole::from("root"), UserRole::User);
        assert_eq!(String::from(UserRole::Admin), "admin");
    }

    #[test]
    fn test_refresh_token_validity() {
        let now = Utc::now();
        let mut user = User::new("a@x.com".into(), "hash".into(), None);
        assert!(!user.has_valid_refresh_token("abc", now));

        user.set_refresh_token("abc".into(), now + Duration::days(1));
        assert!(user.has_valid_refresh_token("abc", now));
        assert!(!user.has_valid_refresh_token("abd", now));
        assert!(!user.has_valid_refresh_token("abc", now + Duration::days(2)));
    }

    #[test]
    fn test_soft_delete_clears_refresh_token() {
        let mut user = User::new("a@x.com".into(), "hash".into(), None);
        user.set_refresh_token("abc".into(), Utc::now() + Duration::days(1));
        user.soft_delete();

        assert!(!user.is_active());
        assert!(user.refresh_token.is_none());
    }
}
