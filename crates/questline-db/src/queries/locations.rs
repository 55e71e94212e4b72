//! Location (world) queries.

use rusqlite::Connection;

use questline_types::catalog::Location;
use questline_types::{LocationId, TrackId};

use crate::{constraint, not_found, DbError, Result};

const COLUMNS: &str = "id, track_id, title, description, title_en, title_ru, description_en,
     description_ru, sort_order";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        track_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        title_en: row.get(4)?,
        title_ru: row.get(5)?,
        description_en: row.get(6)?,
        description_ru: row.get(7)?,
        order: row.get(8)?,
    })
}

/// Insert a location; `location.id` is ignored.
pub fn insert(conn: &Connection, location: &Location) -> Result<LocationId> {
    conn.execute(
        "INSERT INTO locations (track_id, title, description, title_en, title_ru,
             description_en, description_ru, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            location.track_id,
            location.title,
            location.description,
            location.title_en,
            location.title_ru,
            location.description_en,
            location.description_ru,
            location.order,
        ],
    )
    .map_err(constraint("track"))?;
    Ok(conn.last_insert_rowid())
}

/// Get a location by id.
pub fn get(conn: &Connection, id: LocationId) -> Result<Location> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM locations WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(not_found("location"))
}

/// List locations, optionally restricted to one track, ordered by (order, id).
pub fn list(conn: &Connection, track: Option<TrackId>) -> Result<Vec<Location>> {
    let rows = match track {
        Some(track_id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM locations WHERE track_id = ?1 ORDER BY sort_order, id"
            ))?;
            let rows = stmt
                .query_map([track_id], from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM locations ORDER BY sort_order, id"
            ))?;
            let rows = stmt
                .query_map([], from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

/// Overwrite every column of an existing location.
pub fn update(conn: &Connection, location: &Location) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE locations SET track_id = ?2, title = ?3, description = ?4, title_en = ?5,
                 title_ru = ?6, description_en = ?7, description_ru = ?8, sort_order = ?9
             WHERE id = ?1",
            rusqlite::params![
                location.id,
                location.track_id,
                location.title,
                location.description,
                location.title_en,
                location.title_ru,
                location.description_en,
                location.description_ru,
                location.order,
            ],
        )
        .map_err(constraint("track"))?;
    if changed == 0 {
        return Err(DbError::NotFound("location".into()));
    }
    Ok(())
}

/// Delete a location and its missions.
pub fn delete(conn: &Connection, id: LocationId) -> Result<()> {
    let changed = conn.execute("DELETE FROM locations WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(DbError::NotFound("location".into()));
    }
    Ok(())
}
