//! Demo seeding for local environments.

use questline_auth::{now_secs, password::hash_password};
use questline_db::queries::{profiles, users};
use questline_db::seed::{self, DemoContent};
use rusqlite::Connection;
use tracing::info;

pub const ADMIN_USERNAME_ENV: &str = "DEMO_ADMIN_USERNAME";
pub const ADMIN_EMAIL_ENV: &str = "DEMO_ADMIN_EMAIL";
pub const ADMIN_PASSWORD_ENV: &str = "DEMO_ADMIN_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for DemoAdmin {
    fn default() -> Self {
        Self {
            username: "admin".into(),
            email: "admin@example.com".into(),
            password: "admin123".into(),
        }
    }
}

impl DemoAdmin {
    /// Read the credentials from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |key: &str, fallback: String| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };
        Self {
            username: var(ADMIN_USERNAME_ENV, defaults.username),
            email: var(ADMIN_EMAIL_ENV, defaults.email),
            password: var(ADMIN_PASSWORD_ENV, defaults.password),
        }
    }
}

/// Load the demo catalog and make sure the admin account exists.
/// Safe to run on every start.
pub fn seed(conn: &mut Connection, admin: &DemoAdmin) -> anyhow::Result<DemoContent> {
    let tx = conn.transaction()?;
    let content = seed::load_demo_content(&tx)?;

    if users::username_exists(&tx, &admin.username)? {
        info!(username = %admin.username, "Demo admin already present");
    } else {
        let hash = hash_password(&admin.password)?;
        let id = users::insert(
            &tx,
            &users::NewUser {
                username: &admin.username,
                email: &admin.email,
                display_name: "",
                password_hash: &hash,
                is_active: true,
                is_staff: true,
            },
            now_secs(),
        )?;
        profiles::insert(&tx, id)?;
        info!(username = %admin.username, user_id = id, "Demo admin created");
    }

    tx.commit()?;
    info!(track = content.track, "Demo content loaded");
    Ok(content)
}
