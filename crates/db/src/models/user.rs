//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use writetalent_core::types::{DbId, Timestamp};

/// Account type for a young writer.
pub const USER_TYPE_CHILD: &str = "child";
/// Account type for a parent or guardian.
pub const USER_TYPE_PARENT: &str = "parent";

/// All accepted values of `users.user_type`.
pub const VALID_USER_TYPES: &[&str] = &[USER_TYPE_CHILD, USER_TYPE_PARENT];

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub user_type: String,
    pub age: Option<i32>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub tokens: i32,
    pub followers_count: i32,
    pub following_count: i32,
    pub works_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub user_type: String,
    pub age: Option<i32>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub tokens: i32,
    pub followers_count: i32,
    pub following_count: i32,
    pub works_count: i32,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            user_type: user.user_type,
            age: user.age,
            avatar: user.avatar,
            bio: user.bio,
            tokens: user.tokens,
            followers_count: user.followers_count,
            following_count: user.following_count,
            works_count: user.works_count,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. Counters start at zero.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub age: Option<i32>,
    pub avatar: Option<String>,
}

/// Avatar URL derived from the username.
pub fn default_avatar_url(username: &str) -> String {
    let seed: String = username
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={seed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_seed_is_url_safe() {
        assert_eq!(
            default_avatar_url("Tony B"),
            "https://api.dicebear.com/7.x/avataaars/svg?seed=Tony-B"
        );
    }
}
