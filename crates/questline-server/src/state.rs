//! Shared server state.

use std::sync::Arc;

use questline_auth::jwt::JwtKeys;
use rusqlite::Connection;
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::config::ServerConfig;
use crate::mail::{self, Mail, Mailer};

/// Application state shared across handlers.
pub struct AppState {
    /// Database connection. Every request holds the lock for its whole
    /// unit of work, so writes never interleave.
    pub db: Arc<Mutex<Connection>>,
    pub config: ServerConfig,
    pub keys: JwtKeys,
    pub mailer: Arc<dyn Mailer>,
}

pub type AppStateArc = Arc<AppState>;

impl AppState {
    pub fn new(conn: Connection, config: ServerConfig, mailer: Arc<dyn Mailer>) -> Self {
        let keys = signing_keys(&config);
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            keys,
            mailer,
        }
    }

    pub async fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().await
    }

    /// Queue a mail unless mail is switched off.
    pub fn send_mail(&self, mail: Mail) {
        if self.config.mail.enabled {
            mail::send_best_effort(self.mailer.clone(), mail);
        }
    }

    /// Absolute or relative link for a mail body.
    pub fn link(&self, path: &str) -> String {
        mail::link(&self.config.mail.frontend_base_url, path)
    }
}

fn signing_keys(config: &ServerConfig) -> JwtKeys {
    let auth = &config.auth;
    if auth.jwt_secret.is_empty() {
        warn!("auth.jwt_secret is empty; using a random secret, tokens will not survive a restart");
        JwtKeys::random(auth.access_ttl_secs(), auth.refresh_ttl_secs())
    } else {
        JwtKeys::new(
            auth.jwt_secret.as_bytes(),
            auth.access_ttl_secs(),
            auth.refresh_ttl_secs(),
        )
    }
}
