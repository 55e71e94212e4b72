//! Track queries.

use rusqlite::Connection;

use questline_types::catalog::Track;
use questline_types::TrackId;

use crate::{constraint, not_found, DbError, Result};

const COLUMNS: &str = "id, slug, title, description, title_en, title_ru, description_en,
     description_ru, tagline_en, tagline_ru, icon_url, banner_url, color_theme, sort_order,
     is_active, is_premium, default_language";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        title_en: row.get(4)?,
        title_ru: row.get(5)?,
        description_en: row.get(6)?,
        description_ru: row.get(7)?,
        tagline_en: row.get(8)?,
        tagline_ru: row.get(9)?,
        icon_url: row.get(10)?,
        banner_url: row.get(11)?,
        color_theme: row.get(12)?,
        order: row.get(13)?,
        is_active: row.get(14)?,
        is_premium: row.get(15)?,
        default_language: row.get(16)?,
    })
}

/// Insert a track; `track.id` is ignored. Returns the new id.
pub fn insert(conn: &Connection, track: &Track) -> Result<TrackId> {
    conn.execute(
        "INSERT INTO tracks (slug, title, description, title_en, title_ru, description_en,
             description_ru, tagline_en, tagline_ru, icon_url, banner_url, color_theme,
             sort_order, is_active, is_premium, default_language)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        rusqlite::params![
            track.slug,
            track.title,
            track.description,
            track.title_en,
            track.title_ru,
            track.description_en,
            track.description_ru,
            track.tagline_en,
            track.tagline_ru,
            track.icon_url,
            track.banner_url,
            track.color_theme,
            track.order,
            track.is_active,
            track.is_premium,
            track.default_language,
        ],
    )
    .map_err(constraint("slug"))?;
    Ok(conn.last_insert_rowid())
}

/// Get a track by id.
pub fn get(conn: &Connection, id: TrackId) -> Result<Track> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM tracks WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(not_found("track"))
}

/// Get a track by slug.
pub fn get_by_slug(conn: &Connection, slug: &str) -> Result<Track> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM tracks WHERE slug = ?1"),
        [slug],
        from_row,
    )
    .map_err(not_found("track"))
}

/// List tracks ordered by (order, id).
pub fn list(conn: &Connection, active_only: bool) -> Result<Vec<Track>> {
    let filter = if active_only { "WHERE is_active = 1" } else { "" };
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM tracks {filter} ORDER BY sort_order, id"
    ))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Overwrite every column of an existing track.
pub fn update(conn: &Connection, track: &Track) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE tracks SET slug = ?2, title = ?3, description = ?4, title_en = ?5,
                 title_ru = ?6, description_en = ?7, description_ru = ?8, tagline_en = ?9,
                 tagline_ru = ?10, icon_url = ?11, banner_url = ?12, color_theme = ?13,
                 sort_order = ?14, is_active = ?15, is_premium = ?16, default_language = ?17
             WHERE id = ?1",
            rusqlite::params![
                track.id,
                track.slug,
                track.title,
                track.description,
                track.title_en,
                track.title_ru,
                track.description_en,
                track.description_ru,
                track.tagline_en,
                track.tagline_ru,
                track.icon_url,
                track.banner_url,
                track.color_theme,
                track.order,
                track.is_active,
                track.is_premium,
                track.default_language,
            ],
        )
        .map_err(constraint("slug"))?;
    if changed == 0 {
        return Err(DbError::NotFound("track".into()));
    }
    Ok(())
}

/// Delete a track and everything beneath it.
pub fn delete(conn: &Connection, id: TrackId) -> Result<()> {
    let changed = conn.execute("DELETE FROM tracks WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(DbError::NotFound("track".into()));
    }
    Ok(())
}
