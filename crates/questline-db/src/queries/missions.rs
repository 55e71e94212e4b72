//! Mission queries, including the prerequisite graph.

use std::collections::HashMap;

use rusqlite::Connection;

use questline_types::catalog::Mission;
use questline_types::{LocationId, MissionId};

use crate::{constraint, not_found, DbError, Result};

const COLUMNS: &str = "id, location_id, title, description, title_en, title_ru, description_en,
     description_ru, xp_reward, sort_order, is_active, min_level, repeatable, repeat_xp_rate,
     pos_x, pos_y";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Mission> {
    Ok(Mission {
        id: row.get(0)?,
        location_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        title_en: row.get(4)?,
        title_ru: row.get(5)?,
        description_en: row.get(6)?,
        description_ru: row.get(7)?,
        xp_reward: row.get(8)?,
        order: row.get(9)?,
        is_active: row.get(10)?,
        prerequisites: Vec::new(),
        min_level: row.get(11)?,
        repeatable: row.get(12)?,
        repeat_xp_rate: row.get(13)?,
        pos_x: row.get(14)?,
        pos_y: row.get(15)?,
    })
}

/// Insert a mission and its prerequisite edges; `mission.id` is ignored.
pub fn insert(conn: &Connection, mission: &Mission) -> Result<MissionId> {
    conn.execute(
        "INSERT INTO missions (location_id, title, description, title_en, title_ru,
             description_en, description_ru, xp_reward, sort_order, is_active, min_level,
             repeatable, repeat_xp_rate, pos_x, pos_y)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        rusqlite::params![
            mission.location_id,
            mission.title,
            mission.description,
            mission.title_en,
            mission.title_ru,
            mission.description_en,
            mission.description_ru,
            mission.xp_reward,
            mission.order,
            mission.is_active,
            mission.min_level,
            mission.repeatable,
            mission.repeat_xp_rate,
            mission.pos_x,
            mission.pos_y,
        ],
    )
    .map_err(constraint("location"))?;
    let id = conn.last_insert_rowid();
    set_prerequisites(conn, id, &mission.prerequisites)?;
    Ok(id)
}

/// Replace the prerequisite set of a mission.
pub fn set_prerequisites(
    conn: &Connection,
    mission_id: MissionId,
    prerequisites: &[MissionId],
) -> Result<()> {
    conn.execute(
        "DELETE FROM mission_prerequisites WHERE mission_id = ?1",
        [mission_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO mission_prerequisites (mission_id, prerequisite_id)
         VALUES (?1, ?2)",
    )?;
    for prerequisite in prerequisites {
        stmt.execute([mission_id, *prerequisite])
            .map_err(constraint("prerequisites"))?;
    }
    Ok(())
}

/// Add one prerequisite edge, keeping existing ones.
pub fn add_prerequisite(
    conn: &Connection,
    mission_id: MissionId,
    prerequisite_id: MissionId,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO mission_prerequisites (mission_id, prerequisite_id)
         VALUES (?1, ?2)",
        [mission_id, prerequisite_id],
    )
    .map_err(constraint("prerequisites"))?;
    Ok(())
}

/// Prerequisite ids of one mission, ascending.
pub fn prerequisites(conn: &Connection, mission_id: MissionId) -> Result<Vec<MissionId>> {
    let mut stmt = conn.prepare(
        "SELECT prerequisite_id FROM mission_prerequisites
         WHERE mission_id = ?1 ORDER BY prerequisite_id",
    )?;
    let rows = stmt
        .query_map([mission_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn prerequisite_map(conn: &Connection) -> Result<HashMap<MissionId, Vec<MissionId>>> {
    let mut stmt = conn.prepare(
        "SELECT mission_id, prerequisite_id FROM mission_prerequisites
         ORDER BY mission_id, prerequisite_id",
    )?;
    let mut map: HashMap<MissionId, Vec<MissionId>> = HashMap::new();
    let edges = stmt.query_map([], |row| {
        Ok((row.get::<_, MissionId>(0)?, row.get::<_, MissionId>(1)?))
    })?;
    for edge in edges {
        let (mission_id, prerequisite_id) = edge?;
        map.entry(mission_id).or_default().push(prerequisite_id);
    }
    Ok(map)
}

/// Get a mission with its prerequisites.
pub fn get(conn: &Connection, id: MissionId) -> Result<Mission> {
    let mut mission = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM missions WHERE id = ?1"),
            [id],
            from_row,
        )
        .map_err(not_found("mission"))?;
    mission.prerequisites = prerequisites(conn, id)?;
    Ok(mission)
}

/// List missions, optionally within one location, ordered by (order, id).
pub fn list(conn: &Connection, location: Option<LocationId>) -> Result<Vec<Mission>> {
    let mut missions = match location {
        Some(location_id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM missions WHERE location_id = ?1 ORDER BY sort_order, id"
            ))?;
            let rows = stmt
                .query_map([location_id], from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM missions ORDER BY sort_order, id"
            ))?;
            let rows = stmt
                .query_map([], from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };

    let mut edges = prerequisite_map(conn)?;
    for mission in &mut missions {
        if let Some(prerequisites) = edges.remove(&mission.id) {
            mission.prerequisites = prerequisites;
        }
    }
    Ok(missions)
}

/// Overwrite an existing mission, prerequisites included.
pub fn update(conn: &Connection, mission: &Mission) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE missions SET location_id = ?2, title = ?3, description = ?4, title_en = ?5,
                 title_ru = ?6, description_en = ?7, description_ru = ?8, xp_reward = ?9,
                 sort_order = ?10, is_active = ?11, min_level = ?12, repeatable = ?13,
                 repeat_xp_rate = ?14, pos_x = ?15, pos_y = ?16
             WHERE id = ?1",
            rusqlite::params![
                mission.id,
                mission.location_id,
                mission.title,
                mission.description,
                mission.title_en,
                mission.title_ru,
                mission.description_en,
                mission.description_ru,
                mission.xp_reward,
                mission.order,
                mission.is_active,
                mission.min_level,
                mission.repeatable,
                mission.repeat_xp_rate,
                mission.pos_x,
                mission.pos_y,
            ],
        )
        .map_err(constraint("location"))?;
    if changed == 0 {
        return Err(DbError::NotFound("mission".into()));
    }
    set_prerequisites(conn, mission.id, &mission.prerequisites)
}

/// Delete a mission, its tasks and every progress row on it.
pub fn delete(conn: &Connection, id: MissionId) -> Result<()> {
    let changed = conn.execute("DELETE FROM missions WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(DbError::NotFound("mission".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::locations;
    use questline_types::catalog::Location;

    fn test_db_with_location() -> (Connection, LocationId) {
        let conn = crate::open_memory().expect("open");
        let location_id = locations::insert(
            &conn,
            &Location {
                title: "World".into(),
                ..Location::default()
            },
        )
        .expect("location");
        (conn, location_id)
    }

    fn mission(location_id: LocationId, title: &str, order: i64) -> Mission {
        Mission {
            location_id,
            title: title.into(),
            order,
            ..Mission::default()
        }
    }

    #[test]
    fn test_insert_and_get_with_prerequisites() {
        let (conn, loc) = test_db_with_location();
        let intro = insert(&conn, &mission(loc, "Intro", 0)).expect("intro");
        let gate = insert(
            &conn,
            &Mission {
                min_level: 2,
                xp_reward: 120,
                prerequisites: vec![intro],
                ..mission(loc, "Gate", 1)
            },
        )
        .expect("gate");

        let loaded = get(&conn, gate).expect("get");
        assert_eq!(loaded.prerequisites, vec![intro]);
        assert_eq!(loaded.min_level, 2);
        assert_eq!(loaded.xp_reward, 120);
        assert!(get(&conn, intro).expect("get").prerequisites.is_empty());
    }

    #[test]
    fn test_list_orders_and_attaches_prerequisites() {
        let (conn, loc) = test_db_with_location();
        let b = insert(&conn, &mission(loc, "B", 2)).expect("b");
        let a = insert(&conn, &mission(loc, "A", 1)).expect("a");
        set_prerequisites(&conn, b, &[a]).expect("edges");

        let listed = list(&conn, Some(loc)).expect("list");
        let titles: Vec<&str> = listed.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(listed[1].prerequisites, vec![a]);
    }

    #[test]
    fn test_cycle_is_stored() {
        let (conn, loc) = test_db_with_location();
        let a = insert(&conn, &mission(loc, "A", 0)).expect("a");
        let b = insert(
            &conn,
            &Mission {
                prerequisites: vec![a],
                ..mission(loc, "B", 1)
            },
        )
        .expect("b");
        set_prerequisites(&conn, a, &[b]).expect("close the cycle");
        assert_eq!(prerequisites(&conn, a).expect("edges"), vec![b]);
        assert_eq!(prerequisites(&conn, b).expect("edges"), vec![a]);
    }

    #[test]
    fn test_unknown_prerequisite_rejected() {
        let (conn, loc) = test_db_with_location();
        let a = insert(&conn, &mission(loc, "A", 0)).expect("a");
        assert!(matches!(
            set_prerequisites(&conn, a, &[999]),
            Err(DbError::Constraint(_))
        ));
    }

    #[test]
    fn test_update_replaces_prerequisites() {
        let (conn, loc) = test_db_with_location();
        let a = insert(&conn, &mission(loc, "A", 0)).expect("a");
        let b = insert(&conn, &mission(loc, "B", 1)).expect("b");
        let mut c = get(
            &conn,
            insert(
                &conn,
                &Mission {
                    prerequisites: vec![a],
                    ..mission(loc, "C", 2)
                },
            )
            .expect("c"),
        )
        .expect("get");
        c.prerequisites = vec![b];
        c.is_active = false;
        update(&conn, &c).expect("update");
        let reloaded = get(&conn, c.id).expect("get");
        assert_eq!(reloaded.prerequisites, vec![b]);
        assert!(!reloaded.is_active);
    }

    #[test]
    fn test_delete_drops_edges() {
        let (conn, loc) = test_db_with_location();
        let a = insert(&conn, &mission(loc, "A", 0)).expect("a");
        let b = insert(
            &conn,
            &Mission {
                prerequisites: vec![a],
                ..mission(loc, "B", 1)
            },
        )
        .expect("b");
        delete(&conn, a).expect("delete");
        assert!(get(&conn, b).expect("get").prerequisites.is_empty());
    }
}
