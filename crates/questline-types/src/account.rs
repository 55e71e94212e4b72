//! User accounts.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// A registered account. The password hash never leaves the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_active: bool,
    /// Admin content author.
    pub is_staff: bool,
    pub email_verified: bool,
    pub date_joined: u64,
    pub last_login: Option<u64>,
}

impl User {
    /// Name shown on leaderboards.
    pub fn display(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}
