//! Leaderboard snapshot queries.

use rusqlite::Connection;

use questline_types::leaderboard::{LeaderboardEntry, LeaderboardScope};
use questline_types::{TrackId, UserId};

use crate::{parse_column, Result};

/// Read filter. `None` fields are not filtered on.
#[derive(Debug, Clone, Copy)]
pub struct Filter<'a> {
    pub track_slug: Option<&'a str>,
    pub scope: Option<&'a str>,
    pub period: &'a str,
    pub limit: usize,
}

/// One row to write into a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotRow {
    pub user_id: UserId,
    pub xp_total: u64,
    pub position: u32,
}

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LeaderboardEntry> {
    let scope: String = row.get(3)?;
    Ok(LeaderboardEntry {
        id: row.get(0)?,
        track_id: row.get(1)?,
        user_id: row.get(2)?,
        scope: parse_column(3, &scope)?,
        period_label: row.get(4)?,
        xp_total: row.get::<_, i64>(5)? as u64,
        position: row.get(6)?,
        snapshot_at: row.get::<_, i64>(7)? as u64,
    })
}

/// Snapshot rows ordered by (position, -xp_total).
pub fn list(conn: &Connection, filter: &Filter<'_>) -> Result<Vec<LeaderboardEntry>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.track_id, e.user_id, e.scope, e.period_label, e.xp_total, e.position,
                e.snapshot_at
         FROM leaderboard_entries e
         LEFT JOIN tracks t ON t.id = e.track_id
         WHERE (?1 IS NULL OR t.slug = ?1)
           AND (?2 IS NULL OR e.scope = ?2)
           AND e.period_label = ?3
         ORDER BY e.position, e.xp_total DESC
         LIMIT ?4",
    )?;
    let rows = stmt
        .query_map(
            rusqlite::params![
                filter.track_slug,
                filter.scope,
                filter.period,
                filter.limit as i64,
            ],
            from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Replace one (scope, track, period) snapshot with `rows`.
///
/// Run inside a transaction so readers never see a half-written snapshot.
pub fn replace_snapshot(
    conn: &Connection,
    scope: LeaderboardScope,
    track_id: Option<TrackId>,
    period: &str,
    rows: &[SnapshotRow],
    now: u64,
) -> Result<()> {
    conn.execute(
        "DELETE FROM leaderboard_entries
         WHERE scope = ?1 AND period_label = ?2 AND track_id IS ?3",
        rusqlite::params![scope.as_str(), period, track_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO leaderboard_entries
             (track_id, user_id, scope, period_label, xp_total, position, snapshot_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for row in rows {
        stmt.execute(rusqlite::params![
            track_id,
            row.user_id,
            scope.as_str(),
            period,
            row.xp_total as i64,
            row.position,
            now as i64,
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{tracks, users};
    use questline_types::catalog::Track;
    use questline_types::ALL_TIME_PERIOD;

    fn user(conn: &Connection, name: &str) -> UserId {
        users::insert(
            conn,
            &users::NewUser {
                username: name,
                email: "",
                display_name: "",
                password_hash: "x",
                is_active: true,
                is_staff: false,
            },
            0,
        )
        .expect("user")
    }

    fn all(period: &str) -> Filter<'_> {
        Filter {
            track_slug: None,
            scope: None,
            period,
            limit: 200,
        }
    }

    #[test]
    fn test_replace_and_list() {
        let conn = crate::open_memory().expect("open");
        let a = user(&conn, "a");
        let b = user(&conn, "b");
        let rows = [
            SnapshotRow {
                user_id: b,
                xp_total: 300,
                position: 1,
            },
            SnapshotRow {
                user_id: a,
                xp_total: 100,
                position: 2,
            },
        ];
        replace_snapshot(&conn, LeaderboardScope::Global, None, ALL_TIME_PERIOD, &rows, 10)
            .expect("write");
        let listed = list(&conn, &all(ALL_TIME_PERIOD)).expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].user_id, b);
        assert_eq!(listed[0].scope, LeaderboardScope::Global);
        assert_eq!(listed[1].position, 2);
        assert!(list(&conn, &all("weekly")).expect("list").is_empty());

        // second write replaces, not appends
        replace_snapshot(&conn, LeaderboardScope::Global, None, ALL_TIME_PERIOD, &rows[1..], 20)
            .expect("rewrite");
        let listed = list(&conn, &all(ALL_TIME_PERIOD)).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].snapshot_at, 20);
    }

    #[test]
    fn test_filter_by_track_slug_and_scope() {
        let conn = crate::open_memory().expect("open");
        let a = user(&conn, "a");
        let track = tracks::insert(
            &conn,
            &Track {
                slug: "python".into(),
                title: "Python".into(),
                ..Track::default()
            },
        )
        .expect("track");
        let row = [SnapshotRow {
            user_id: a,
            xp_total: 250,
            position: 1,
        }];
        replace_snapshot(&conn, LeaderboardScope::Track, Some(track), ALL_TIME_PERIOD, &row, 0)
            .expect("track scope");
        replace_snapshot(&conn, LeaderboardScope::Global, None, ALL_TIME_PERIOD, &row, 0)
            .expect("global scope");

        let by_track = list(
            &conn,
            &Filter {
                track_slug: Some("python"),
                ..all(ALL_TIME_PERIOD)
            },
        )
        .expect("list");
        assert_eq!(by_track.len(), 1);
        assert_eq!(by_track[0].track_id, Some(track));

        let global = list(
            &conn,
            &Filter {
                scope: Some("global"),
                ..all(ALL_TIME_PERIOD)
            },
        )
        .expect("list");
        assert_eq!(global.len(), 1);
        assert!(global[0].track_id.is_none());

        let unknown = list(
            &conn,
            &Filter {
                track_slug: Some("rust"),
                ..all(ALL_TIME_PERIOD)
            },
        )
        .expect("list");
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_limit() {
        let conn = crate::open_memory().expect("open");
        let rows: Vec<SnapshotRow> = (0..5)
            .map(|i| SnapshotRow {
                user_id: user(&conn, &format!("u{i}")),
                xp_total: 100 - i,
                position: i as u32 + 1,
            })
            .collect();
        replace_snapshot(&conn, LeaderboardScope::Global, None, ALL_TIME_PERIOD, &rows, 0)
            .expect("write");
        let listed = list(
            &conn,
            &Filter {
                limit: 3,
                ..all(ALL_TIME_PERIOD)
            },
        )
        .expect("list");
        assert_eq!(listed.len(), 3);
    }
}
