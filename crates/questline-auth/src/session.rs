//! Login, refresh rotation and logout.
//!
//! Rotation blacklists the presented refresh token's `jti` and hands out a
//! new one; a blacklisted token is refused on every later refresh.

use rusqlite::Connection;
use serde::Serialize;

use questline_db::queries::{tokens, users};
use questline_db::DbError;

use crate::jwt::{JwtKeys, TokenPair, TokenType};
use crate::password::verify_password;
use crate::{AuthError, Result};

/// Result of a refresh. `refresh` is only set when rotation is on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Refreshed {
    pub access: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Exchange credentials for a token pair.
pub fn login(
    conn: &Connection,
    keys: &JwtKeys,
    username: &str,
    password: &str,
    now: u64,
) -> Result<TokenPair> {
    let user = match users::get_by_username(conn, username) {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => return Err(AuthError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };
    if !user.is_active || !verify_password(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }
    users::touch_last_login(conn, user.id, now)?;
    tracing::info!(user_id = user.id, "login");
    keys.pair(user.id, now)
}

/// Exchange a refresh token for a new access token.
pub fn refresh(
    conn: &Connection,
    keys: &JwtKeys,
    refresh_token: &str,
    rotate: bool,
    now: u64,
) -> Result<Refreshed> {
    let claims = keys.decode(refresh_token, TokenType::Refresh, now)?;
    if tokens::is_blacklisted(conn, &claims.jti)? {
        return Err(AuthError::Blacklisted);
    }
    let user_id = claims.user_id()?;
    let user = match users::get(conn, user_id) {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => {
            return Err(AuthError::InvalidToken("user no longer exists".into()))
        }
        Err(e) => return Err(e.into()),
    };
    if !user.is_active {
        return Err(AuthError::InvalidCredentials);
    }

    let (access, _) = keys.issue(user_id, TokenType::Access, now)?;
    let refresh = if rotate {
        tokens::blacklist(conn, &claims.jti, user_id, claims.exp, now)?;
        let (token, _) = keys.issue(user_id, TokenType::Refresh, now)?;
        Some(token)
    } else {
        None
    };
    Ok(Refreshed { access, refresh })
}

/// Blacklist a refresh token, ending the session it belongs to.
pub fn logout(conn: &Connection, keys: &JwtKeys, refresh_token: &str, now: u64) -> Result<()> {
    let claims = keys.decode(refresh_token, TokenType::Refresh, now)?;
    let user_id = claims.user_id()?;
    tokens::blacklist(conn, &claims.jti, user_id, claims.exp, now)?;
    tracing::info!(user_id, "logout");
    Ok(())
}
