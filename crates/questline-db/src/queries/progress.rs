//! Mission progress queries.

use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension};

use questline_types::progress::Progress;
use questline_types::{MissionId, TrackId, UserId};

use crate::{constraint, not_found, opt_ts, parse_column, DbError, Result};

const COLUMNS: &str = "id, user_id, mission_id, completed, status, attempts, started_at,
     last_started_at, completed_at, xp_earned, stars";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Progress> {
    let status: String = row.get(4)?;
    Ok(Progress {
        id: row.get(0)?,
        user_id: row.get(1)?,
        mission_id: row.get(2)?,
        completed: row.get(3)?,
        status: parse_column(4, &status)?,
        attempts: row.get(5)?,
        started_at: opt_ts(row.get(6)?),
        last_started_at: opt_ts(row.get(7)?),
        completed_at: opt_ts(row.get(8)?),
        xp_earned: row.get::<_, i64>(9)? as u64,
        stars: row.get(10)?,
    })
}

/// The caller's progress on one mission, if any.
pub fn find(conn: &Connection, user_id: UserId, mission_id: MissionId) -> Result<Option<Progress>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM progress WHERE user_id = ?1 AND mission_id = ?2"),
        [user_id, mission_id],
        from_row,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// Get a progress row by id, scoped to its owner.
pub fn get(conn: &Connection, user_id: UserId, id: i64) -> Result<Progress> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM progress WHERE id = ?1 AND user_id = ?2"),
        [id, user_id],
        from_row,
    )
    .map_err(not_found("progress"))
}

/// All progress rows of a user, by mission.
pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<Progress>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM progress WHERE user_id = ?1 ORDER BY mission_id"
    ))?;
    let rows = stmt
        .query_map([user_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Insert a new row (when `progress.id == 0`) or update the existing one.
/// Returns the row id.
pub fn save(conn: &Connection, progress: &Progress) -> Result<i64> {
    let started_at = progress.started_at.map(|t| t as i64);
    let last_started_at = progress.last_started_at.map(|t| t as i64);
    let completed_at = progress.completed_at.map(|t| t as i64);
    if progress.id == 0 {
        conn.execute(
            "INSERT INTO progress (user_id, mission_id, completed, status, attempts, started_at,
                 last_started_at, completed_at, xp_earned, stars)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                progress.user_id,
                progress.mission_id,
                progress.completed,
                progress.status.as_str(),
                progress.attempts,
                started_at,
                last_started_at,
                completed_at,
                progress.xp_earned as i64,
                progress.stars,
            ],
        )
        .map_err(constraint("progress"))?;
        return Ok(conn.last_insert_rowid());
    }

    let changed = conn.execute(
        "UPDATE progress SET completed = ?2, status = ?3, attempts = ?4, started_at = ?5,
             last_started_at = ?6, completed_at = ?7, xp_earned = ?8, stars = ?9
         WHERE id = ?1",
        rusqlite::params![
            progress.id,
            progress.completed,
            progress.status.as_str(),
            progress.attempts,
            started_at,
            last_started_at,
            completed_at,
            progress.xp_earned as i64,
            progress.stars,
        ],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound("progress".into()));
    }
    Ok(progress.id)
}

/// Ids of missions the user has completed at least once.
pub fn completed_missions(conn: &Connection, user_id: UserId) -> Result<HashSet<MissionId>> {
    let mut stmt =
        conn.prepare("SELECT mission_id FROM progress WHERE user_id = ?1 AND completed = 1")?;
    let rows = stmt
        .query_map([user_id], |row| row.get(0))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(rows)
}

/// `(user, xp)` totals earned on one track's missions by active users.
pub fn track_totals(conn: &Connection, track_id: TrackId) -> Result<Vec<(UserId, u64)>> {
    let mut stmt = conn.prepare(
        "SELECT p.user_id, SUM(p.xp_earned) FROM progress p
         JOIN missions m ON m.id = p.mission_id
         JOIN locations l ON l.id = m.location_id
         JOIN users u ON u.id = p.user_id
         WHERE l.track_id = ?1 AND u.is_active = 1
         GROUP BY p.user_id",
    )?;
    let rows = stmt
        .query_map([track_id], |row| {
            Ok((row.get(0)?, row.get::<_, i64>(1)? as u64))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
