//! Mission task queries.

use rusqlite::Connection;

use questline_types::catalog::{MissionTask, TaskType};
use questline_types::{MissionId, TaskId};

use crate::{constraint, json_column, json_text, not_found, parse_column, DbError, Result};

const COLUMNS: &str = "id, mission_id, sort_order, task_type, title, title_en, title_ru, body,
     body_en, body_ru, data, xp_reward, is_required, estimated_minutes, is_side_quest";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MissionTask> {
    let task_type: String = row.get(3)?;
    let data: String = row.get(10)?;
    Ok(MissionTask {
        id: row.get(0)?,
        mission_id: row.get(1)?,
        order: row.get(2)?,
        task_type: parse_column(3, &task_type)?,
        title: row.get(4)?,
        title_en: row.get(5)?,
        title_ru: row.get(6)?,
        body: row.get(7)?,
        body_en: row.get(8)?,
        body_ru: row.get(9)?,
        data: json_column(10, &data)?,
        xp_reward: row.get(11)?,
        is_required: row.get(12)?,
        estimated_minutes: row.get(13)?,
        is_side_quest: row.get(14)?,
    })
}

/// Insert a task; `task.id` is ignored.
pub fn insert(conn: &Connection, task: &MissionTask) -> Result<TaskId> {
    conn.execute(
        "INSERT INTO mission_tasks (mission_id, sort_order, task_type, title, title_en,
             title_ru, body, body_en, body_ru, data, xp_reward, is_required,
             estimated_minutes, is_side_quest)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        rusqlite::params![
            task.mission_id,
            task.order,
            task.task_type.as_str(),
            task.title,
            task.title_en,
            task.title_ru,
            task.body,
            task.body_en,
            task.body_ru,
            json_text(&task.data)?,
            task.xp_reward,
            task.is_required,
            task.estimated_minutes,
            task.is_side_quest,
        ],
    )
    .map_err(constraint("mission"))?;
    Ok(conn.last_insert_rowid())
}

/// Get a task by id.
pub fn get(conn: &Connection, id: TaskId) -> Result<MissionTask> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM mission_tasks WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(not_found("mission task"))
}

/// List tasks ordered by (mission, order, id), with optional filters.
pub fn list(
    conn: &Connection,
    mission: Option<MissionId>,
    task_type: Option<TaskType>,
) -> Result<Vec<MissionTask>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM mission_tasks
         WHERE (?1 IS NULL OR mission_id = ?1) AND (?2 IS NULL OR task_type = ?2)
         ORDER BY mission_id, sort_order, id"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![mission, task_type.map(TaskType::as_str)],
            from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Overwrite an existing task.
pub fn update(conn: &Connection, task: &MissionTask) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE mission_tasks SET mission_id = ?2, sort_order = ?3, task_type = ?4,
                 title = ?5, title_en = ?6, title_ru = ?7, body = ?8, body_en = ?9,
                 body_ru = ?10, data = ?11, xp_reward = ?12, is_required = ?13,
                 estimated_minutes = ?14, is_side_quest = ?15
             WHERE id = ?1",
            rusqlite::params![
                task.id,
                task.mission_id,
                task.order,
                task.task_type.as_str(),
                task.title,
                task.title_en,
                task.title_ru,
                task.body,
                task.body_en,
                task.body_ru,
                json_text(&task.data)?,
                task.xp_reward,
                task.is_required,
                task.estimated_minutes,
                task.is_side_quest,
            ],
        )
        .map_err(constraint("mission"))?;
    if changed == 0 {
        return Err(DbError::NotFound("mission task".into()));
    }
    Ok(())
}

/// Delete a task.
pub fn delete(conn: &Connection, id: TaskId) -> Result<()> {
    let changed = conn.execute("DELETE FROM mission_tasks WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(DbError::NotFound("mission task".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{locations, missions};
    use questline_types::catalog::{Location, Mission};

    fn test_db_with_mission() -> (Connection, MissionId) {
        let conn = crate::open_memory().expect("open");
        let loc = locations::insert(&conn, &Location::default()).expect("location");
        let mission = missions::insert(
            &conn,
            &Mission {
                location_id: loc,
                title: "Intro".into(),
                ..Mission::default()
            },
        )
        .expect("mission");
        (conn, mission)
    }

    #[test]
    fn test_insert_get_with_payload() {
        let (conn, mission_id) = test_db_with_mission();
        let id = insert(
            &conn,
            &MissionTask {
                mission_id,
                task_type: TaskType::Quiz,
                title: "Q1".into(),
                data: serde_json::json!({"question": "2+2?", "options": [3, 4]}),
                ..MissionTask::default()
            },
        )
        .expect("insert");
        let task = get(&conn, id).expect("get");
        assert_eq!(task.task_type, TaskType::Quiz);
        assert_eq!(task.data["options"][1], 4);
        assert_eq!(task.estimated_minutes, 5);
        assert!(task.is_required);
    }

    #[test]
    fn test_list_filters() {
        let (conn, mission_id) = test_db_with_mission();
        for (order, kind) in [(2, TaskType::Code), (1, TaskType::Story), (3, TaskType::Code)] {
            insert(
                &conn,
                &MissionTask {
                    mission_id,
                    order,
                    task_type: kind,
                    ..MissionTask::default()
                },
            )
            .expect("insert");
        }

        let all = list(&conn, Some(mission_id), None).expect("list");
        let orders: Vec<i64> = all.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);

        let code = list(&conn, None, Some(TaskType::Code)).expect("list");
        assert_eq!(code.len(), 2);
        assert!(list(&conn, Some(mission_id + 1), None).expect("list").is_empty());
    }

    #[test]
    fn test_cascade_from_mission() {
        let (conn, mission_id) = test_db_with_mission();
        let id = insert(
            &conn,
            &MissionTask {
                mission_id,
                ..MissionTask::default()
            },
        )
        .expect("insert");
        missions::delete(&conn, mission_id).expect("delete mission");
        assert!(matches!(get(&conn, id), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_update() {
        let (conn, mission_id) = test_db_with_mission();
        let id = insert(
            &conn,
            &MissionTask {
                mission_id,
                ..MissionTask::default()
            },
        )
        .expect("insert");
        let mut task = get(&conn, id).expect("get");
        task.task_type = TaskType::Challenge;
        task.is_side_quest = true;
        update(&conn, &task).expect("update");
        assert_eq!(get(&conn, id).expect("get"), task);
    }
}
