//! Profile (XP ledger) queries.

use rusqlite::Connection;

use questline_types::profile::Profile;
use questline_types::{ClassRoleId, UserId};

use crate::{constraint, not_found, DbError, Result};

/// Create the default profile for a freshly registered user.
pub fn insert(conn: &Connection, user_id: UserId) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (user_id, xp, level, bio) VALUES (?1, 0, 1, '')",
        [user_id],
    )
    .map_err(constraint("profile"))?;
    Ok(())
}

/// Get a user's profile.
pub fn get(conn: &Connection, user_id: UserId) -> Result<Profile> {
    conn.query_row(
        "SELECT user_id, xp, level, bio, class_role_id FROM profiles WHERE user_id = ?1",
        [user_id],
        |row| {
            Ok(Profile {
                user_id: row.get(0)?,
                xp: row.get::<_, i64>(1)? as u64,
                level: row.get(2)?,
                bio: row.get(3)?,
                class_role: row.get::<_, Option<ClassRoleId>>(4)?,
            })
        },
    )
    .map_err(not_found("profile"))
}

/// Persist all mutable profile fields.
pub fn save(conn: &Connection, profile: &Profile) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE profiles SET xp = ?2, level = ?3, bio = ?4, class_role_id = ?5
             WHERE user_id = ?1",
            rusqlite::params![
                profile.user_id,
                profile.xp as i64,
                profile.level,
                profile.bio,
                profile.class_role,
            ],
        )
        .map_err(constraint("class_role"))?;
    if changed == 0 {
        return Err(DbError::NotFound("profile".into()));
    }
    Ok(())
}

/// `(user, xp)` totals of active users, for the global leaderboard.
pub fn xp_totals(conn: &Connection) -> Result<Vec<(UserId, u64)>> {
    let mut stmt = conn.prepare(
        "SELECT p.user_id, p.xp FROM profiles p
         JOIN users u ON u.id = p.user_id
         WHERE u.is_active = 1",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
