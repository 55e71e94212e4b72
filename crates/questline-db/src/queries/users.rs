//! User account queries.

use rusqlite::{Connection, OptionalExtension};

use questline_types::account::User;
use questline_types::UserId;

use crate::{constraint, not_found, opt_ts, DbError, Result};

const COLUMNS: &str = "id, username, email, display_name, password_hash, is_active,
     is_staff, email_verified, date_joined, last_login";

/// Fields supplied when creating an account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub is_staff: bool,
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        display_name: row.get(3)?,
        password_hash: row.get(4)?,
        is_active: row.get(5)?,
        is_staff: row.get(6)?,
        email_verified: row.get(7)?,
        date_joined: row.get::<_, i64>(8)? as u64,
        last_login: opt_ts(row.get(9)?),
    })
}

/// Insert a new user. Fails with [`DbError::Constraint`] on a taken username.
pub fn insert(conn: &Connection, user: &NewUser<'_>, now: u64) -> Result<UserId> {
    conn.execute(
        "INSERT INTO users (username, email, display_name, password_hash, is_active, is_staff, date_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user.username,
            user.email,
            user.display_name,
            user.password_hash,
            user.is_active,
            user.is_staff,
            now as i64,
        ],
    )
    .map_err(constraint("username"))?;
    Ok(conn.last_insert_rowid())
}

/// Get a user by id.
pub fn get(conn: &Connection, id: UserId) -> Result<User> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(not_found("user"))
}

/// Get a user by username.
pub fn get_by_username(conn: &Connection, username: &str) -> Result<User> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM users WHERE username = ?1"),
        [username],
        from_row,
    )
    .map_err(not_found("user"))
}

/// First user registered with this email, if any.
pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM users WHERE email = ?1 ORDER BY id LIMIT 1"),
        [email],
        from_row,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// Whether a username is already registered.
pub fn username_exists(conn: &Connection, username: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        [username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Replace the stored password hash.
pub fn set_password(conn: &Connection, id: UserId, password_hash: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?2 WHERE id = ?1",
        rusqlite::params![id, password_hash],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound("user".into()));
    }
    Ok(())
}

/// Mark the email as verified and activate the account.
pub fn mark_email_verified(conn: &Connection, id: UserId) -> Result<()> {
    let changed = conn.execute(
        "UPDATE users SET is_active = 1, email_verified = 1 WHERE id = ?1",
        [id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound("user".into()));
    }
    Ok(())
}

/// Record a successful login.
pub fn touch_last_login(conn: &Connection, id: UserId, now: u64) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_login = ?2 WHERE id = ?1",
        rusqlite::params![id, now as i64],
    )?;
    Ok(())
}
