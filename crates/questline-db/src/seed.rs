//! Demo content for local environments.
//!
//! Loads the "python-path" track with two worlds and three missions. Every
//! row is looked up before it is created, so loading twice changes nothing.

use rusqlite::{Connection, OptionalExtension};

use questline_types::catalog::{Location, Mission, Track};
use questline_types::{LocationId, MissionId, TrackId};

use crate::queries::{locations, missions, tracks};
use crate::{DbError, Result};

/// Slug of the demo track.
pub const DEMO_TRACK_SLUG: &str = "python-path";

/// Ids of the seeded rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoContent {
    pub track: TrackId,
    pub world1: LocationId,
    pub world2: LocationId,
    pub intro: MissionId,
    pub gate: MissionId,
    pub repeatable: MissionId,
}

/// Load the demo catalog. Returns the ids of the rows, created or existing.
pub fn load_demo_content(conn: &Connection) -> Result<DemoContent> {
    let track = match tracks::get_by_slug(conn, DEMO_TRACK_SLUG) {
        Ok(existing) => existing.id,
        Err(DbError::NotFound(_)) => tracks::insert(conn, &demo_track())?,
        Err(e) => return Err(e),
    };

    let world1 = location_or_insert(
        conn,
        track,
        Location {
            title: "World 1".into(),
            order: 1,
            title_en: "World 1".into(),
            title_ru: "Мир 1: Основы Python".into(),
            description_en: "Core islands that introduce Python syntax and flow.".into(),
            description_ru: "Архипелаг с базовыми уроками по синтаксису и логике Python.".into(),
            ..Location::default()
        },
    )?;
    let world2 = location_or_insert(
        conn,
        track,
        Location {
            title: "World 2".into(),
            order: 2,
            title_en: "World 2".into(),
            title_ru: "Мир 2: Врата Django".into(),
            description_en: "Transition world that prepares students for backend quests.".into(),
            description_ru: "Переходный мир с подготовкой к заданиям Django и бэкенду.".into(),
            ..Location::default()
        },
    )?;

    let intro = mission_or_insert(
        conn,
        Mission {
            location_id: world1,
            title: "Intro".into(),
            order: 1,
            min_level: 1,
            xp_reward: 100,
            repeatable: true,
            repeat_xp_rate: 10,
            pos_x: 12,
            pos_y: 72,
            title_en: "Intro".into(),
            title_ru: "Интродукция".into(),
            description_en: "Learn the interface, energy system and first Python spell.".into(),
            description_ru: "Знакомство с интерфейсом, энергией и первой Python-функцией.".into(),
            ..Mission::default()
        },
    )?;
    let gate = mission_or_insert(
        conn,
        Mission {
            location_id: world1,
            title: "Gate".into(),
            order: 2,
            min_level: 2,
            xp_reward: 120,
            pos_x: 37,
            pos_y: 52,
            title_en: "Gate".into(),
            title_ru: "Врата".into(),
            description_en: "Boss checkpoint that verifies loops and conditions.".into(),
            description_ru: "Босс-проверка на циклы и условия перед следующим миром.".into(),
            ..Mission::default()
        },
    )?;
    let repeatable = mission_or_insert(
        conn,
        Mission {
            location_id: world2,
            title: "Repeatable".into(),
            order: 1,
            min_level: 1,
            xp_reward: 50,
            repeatable: true,
            repeat_xp_rate: 20,
            pos_x: 62,
            pos_y: 37,
            title_en: "Repeatable".into(),
            title_ru: "Повторяемая миссия".into(),
            description_en: "Optional skirmish for extra XP and practicing snippets.".into(),
            description_ru: "Дополнительный бой для прокачки XP и отработки сниппетов.".into(),
            ..Mission::default()
        },
    )?;

    missions::add_prerequisite(conn, gate, intro)?;

    tracing::info!(track, intro, gate, repeatable, "demo content loaded");
    Ok(DemoContent {
        track,
        world1,
        world2,
        intro,
        gate,
        repeatable,
    })
}

fn demo_track() -> Track {
    Track {
        slug: DEMO_TRACK_SLUG.into(),
        title: "Python Path".into(),
        title_ru: "Путь Python".into(),
        description: "Learn Python fundamentals through guided worlds.".into(),
        description_ru: "Освой основы Python через серию миров и миссий.".into(),
        tagline_en: "Your first quest chain".into(),
        tagline_ru: "Твоя первая цепочка квестов".into(),
        color_theme: "from-indigo-900/60 via-primary/20 to-sky-500/20".into(),
        is_active: true,
        default_language: "ru".into(),
        ..Track::default()
    }
}

/// Find a location by title, attaching it to `track` if it has none.
fn location_or_insert(conn: &Connection, track: TrackId, location: Location) -> Result<LocationId> {
    let existing: Option<(LocationId, Option<TrackId>)> = conn
        .query_row(
            "SELECT id, track_id FROM locations WHERE title = ?1 ORDER BY id LIMIT 1",
            [&location.title],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match existing {
        Some((id, Some(_))) => Ok(id),
        Some((id, None)) => {
            conn.execute(
                "UPDATE locations SET track_id = ?2 WHERE id = ?1",
                [id, track],
            )?;
            Ok(id)
        }
        None => locations::insert(
            conn,
            &Location {
                track_id: Some(track),
                ..location
            },
        ),
    }
}

/// Find a mission by title or create it.
fn mission_or_insert(conn: &Connection, mission: Mission) -> Result<MissionId> {
    let existing: Option<MissionId> = conn
        .query_row(
            "SELECT id FROM missions WHERE title = ?1 ORDER BY id LIMIT 1",
            [&mission.title],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(id) => Ok(id),
        None => missions::insert(conn, &mission),
    }
}
