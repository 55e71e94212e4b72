//! Task progress queries. Rows are always scoped to their owner.

use rusqlite::{Connection, OptionalExtension};

use questline_types::progress::TaskProgress;
use questline_types::{TaskId, UserId};

use crate::{constraint, json_column, json_text, not_found, opt_ts, parse_column, DbError, Result};

const COLUMNS: &str =
    "id, user_id, task_id, status, attempts, best_score, last_submitted_at, answer";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskProgress> {
    let status: String = row.get(3)?;
    let answer: String = row.get(7)?;
    Ok(TaskProgress {
        id: row.get(0)?,
        user_id: row.get(1)?,
        task_id: row.get(2)?,
        status: parse_column(3, &status)?,
        attempts: row.get(4)?,
        best_score: row.get(5)?,
        last_submitted_at: opt_ts(row.get(6)?),
        answer: json_column(7, &answer)?,
    })
}

/// Insert a row. Fails with [`DbError::Constraint`] if the pair already
/// exists or the task is unknown.
pub fn insert(conn: &Connection, progress: &TaskProgress) -> Result<i64> {
    conn.execute(
        "INSERT INTO task_progress (user_id, task_id, status, attempts, best_score,
             last_submitted_at, answer)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            progress.user_id,
            progress.task_id,
            progress.status.as_str(),
            progress.attempts,
            progress.best_score,
            progress.last_submitted_at.map(|t| t as i64),
            json_text(&progress.answer)?,
        ],
    )
    .map_err(constraint("task"))?;
    Ok(conn.last_insert_rowid())
}

/// Get a row by id, scoped to its owner.
pub fn get(conn: &Connection, user_id: UserId, id: i64) -> Result<TaskProgress> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM task_progress WHERE id = ?1 AND user_id = ?2"),
        [id, user_id],
        from_row,
    )
    .map_err(not_found("task progress"))
}

/// The user's row for a task, if any.
pub fn find(conn: &Connection, user_id: UserId, task_id: TaskId) -> Result<Option<TaskProgress>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM task_progress WHERE user_id = ?1 AND task_id = ?2"),
        [user_id, task_id],
        from_row,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// All rows of one user, by id.
pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<TaskProgress>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM task_progress WHERE user_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([user_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Persist every mutable field of an existing row.
pub fn update(conn: &Connection, progress: &TaskProgress) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE task_progress SET task_id = ?3, status = ?4, attempts = ?5,
                 best_score = ?6, last_submitted_at = ?7, answer = ?8
             WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![
                progress.id,
                progress.user_id,
                progress.task_id,
                progress.status.as_str(),
                progress.attempts,
                progress.best_score,
                progress.last_submitted_at.map(|t| t as i64),
                json_text(&progress.answer)?,
            ],
        )
        .map_err(constraint("task"))?;
    if changed == 0 {
        return Err(DbError::NotFound("task progress".into()));
    }
    Ok(())
}

/// Delete one of the user's rows.
pub fn delete(conn: &Connection, user_id: UserId, id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM task_progress WHERE id = ?1 AND user_id = ?2",
        [id, user_id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound("task progress".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{locations, missions, tasks, users};
    use questline_types::catalog::{Location, Mission, MissionTask};
    use questline_types::progress::ProgressStatus;

    fn fixture() -> (Connection, UserId, TaskId) {
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
            1000,
        )
        .expect("user");
        let location = locations::insert(&conn, &Location::default()).expect("location");
        let mission = missions::insert(
            &conn,
            &Mission {
                location_id: location,
                ..Mission::default()
            },
        )
        .expect("mission");
        let task = tasks::insert(
            &conn,
            &MissionTask {
                mission_id: mission,
                ..MissionTask::default()
            },
        )
        .expect("task");
        (conn, user, task)
    }

    #[test]
    fn test_insert_find_update() {
        let (conn, user, task) = fixture();
        let mut progress = TaskProgress::new(user, task);
        progress.id = insert(&conn, &progress).expect("insert");

        progress.attempts = 2;
        progress.best_score = 75;
        progress.status = ProgressStatus::InProgress;
        progress.answer = serde_json::json!({"code": "print(1)"});
        progress.last_submitted_at = Some(1500);
        update(&conn, &progress).expect("update");

        let loaded = find(&conn, user, task).expect("find").expect("exists");
        assert_eq!(loaded, progress);
        assert_eq!(list_for_user(&conn, user).expect("list"), vec![progress]);
    }

    #[test]
    fn test_duplicate_pair() {
        let (conn, user, task) = fixture();
        insert(&conn, &TaskProgress::new(user, task)).expect("insert");
        assert!(matches!(
            insert(&conn, &TaskProgress::new(user, task)),
            Err(DbError::Constraint(_))
        ));
    }

    #[test]
    fn test_other_users_rows_invisible() {
        let (conn, user, task) = fixture();
        let id = insert(&conn, &TaskProgress::new(user, task)).expect("insert");
        assert!(matches!(get(&conn, user + 1, id), Err(DbError::NotFound(_))));
        assert!(matches!(
            delete(&conn, user + 1, id),
            Err(DbError::NotFound(_))
        ));
        delete(&conn, user, id).expect("owner delete");
        assert!(find(&conn, user, task).expect("find").is_none());
    }
}
