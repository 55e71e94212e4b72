//! Rank ladder queries.

use rusqlite::Connection;

use questline_types::catalog::Rank;
use questline_types::RankId;

use crate::{constraint, not_found, Result};

const COLUMNS: &str = "id, slug, title_en, title_ru, description_en, description_ru, min_level,
     min_xp, sort_order, icon_url";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rank> {
    Ok(Rank {
        id: row.get(0)?,
        slug: row.get(1)?,
        title_en: row.get(2)?,
        title_ru: row.get(3)?,
        description_en: row.get(4)?,
        description_ru: row.get(5)?,
        min_level: row.get(6)?,
        min_xp: row.get::<_, i64>(7)? as u64,
        order: row.get(8)?,
        icon_url: row.get(9)?,
    })
}

/// Insert a rank; `rank.id` is ignored.
pub fn insert(conn: &Connection, rank: &Rank) -> Result<RankId> {
    conn.execute(
        "INSERT INTO ranks (slug, title_en, title_ru, description_en, description_ru,
             min_level, min_xp, sort_order, icon_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            rank.slug,
            rank.title_en,
            rank.title_ru,
            rank.description_en,
            rank.description_ru,
            rank.min_level,
            rank.min_xp as i64,
            rank.order,
            rank.icon_url,
        ],
    )
    .map_err(constraint("slug"))?;
    Ok(conn.last_insert_rowid())
}

/// Get a rank by id.
pub fn get(conn: &Connection, id: RankId) -> Result<Rank> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM ranks WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(not_found("rank"))
}

/// The ladder, ordered by (order, min_level, min_xp).
pub fn list(conn: &Connection) -> Result<Vec<Rank>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM ranks ORDER BY sort_order, min_level, min_xp"
    ))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
