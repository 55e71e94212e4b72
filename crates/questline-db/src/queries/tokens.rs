//! Refresh-token blacklist.

use rusqlite::Connection;

use questline_types::UserId;

use crate::Result;

/// Blacklist a token id. Blacklisting twice is a no-op.
pub fn blacklist(
    conn: &Connection,
    jti: &str,
    user_id: UserId,
    expires_at: u64,
    now: u64,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO token_blacklist (jti, user_id, expires_at, blacklisted_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![jti, user_id, expires_at as i64, now as i64],
    )?;
    Ok(())
}

/// Whether a token id has been blacklisted.
pub fn is_blacklisted(conn: &Connection, jti: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM token_blacklist WHERE jti = ?1",
        [jti],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Drop entries whose token would have expired anyway. Returns rows removed.
pub fn purge_expired(conn: &Connection, now: u64) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM token_blacklist WHERE expires_at < ?1",
        [now as i64],
    )?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    #[test]
    fn test_blacklist_and_purge() {
        let conn = crate::open_memory().expect("open");
        let user = users::insert(
            &conn,
            &users::NewUser {
                username: "alice",
                email: "",
                display_name: "",
                password_hash: "x",
                is_active: true,
                is_staff: false,
            },
            0,
        )
        .expect("user");

        assert!(!is_blacklisted(&conn, "abc").expect("check"));
        blacklist(&conn, "abc", user, 500, 100).expect("blacklist");
        blacklist(&conn, "abc", user, 500, 101).expect("idempotent");
        blacklist(&conn, "def", user, 5000, 100).expect("blacklist");
        assert!(is_blacklisted(&conn, "abc").expect("check"));

        assert_eq!(purge_expired(&conn, 1000).expect("purge"), 1);
        assert!(!is_blacklisted(&conn, "abc").expect("check"));
        assert!(is_blacklisted(&conn, "def").expect("check"));
    }
}
