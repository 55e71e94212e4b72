//! Missions: catalog reads, admin writes and the start/complete actions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use questline_auth::now_secs;
use questline_db::queries::{missions, profiles, progress};
use questline_engine::{availability, lifecycle, xp};
use questline_types::catalog::Mission;
use questline_types::progress::Progress;
use questline_types::{LocationId, MissionId};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{patch, required};
use crate::error::{ApiError, ApiResult};
use crate::extract::{AuthUser, JsonBody, Lang, MaybeUser, OptionalJson, StaffUser};
use crate::state::AppStateArc;
use crate::views::{CatalogContext, CompletionView, MissionView, ProgressView};

#[derive(Debug, Default, Deserialize)]
pub struct MissionInput {
    pub location: Option<LocationId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub title_en: Option<String>,
    pub title_ru: Option<String>,
    pub description_en: Option<String>,
    pub description_ru: Option<String>,
    pub xp_reward: Option<u32>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
    pub min_level: Option<u32>,
    pub repeatable: Option<bool>,
    pub repeat_xp_rate: Option<u32>,
    pub pos_x: Option<i64>,
    pub pos_y: Option<i64>,
    pub prerequisites: Option<Vec<MissionId>>,
}

impl MissionInput {
    fn apply(self, mission: &mut Mission) {
        patch(&mut mission.location_id, self.location);
        patch(&mut mission.title, self.title);
        patch(&mut mission.description, self.description);
        patch(&mut mission.title_en, self.title_en);
        patch(&mut mission.title_ru, self.title_ru);
        patch(&mut mission.description_en, self.description_en);
        patch(&mut mission.description_ru, self.description_ru);
        patch(&mut mission.xp_reward, self.xp_reward);
        patch(&mut mission.order, self.order);
        patch(&mut mission.is_active, self.is_active);
        patch(&mut mission.min_level, self.min_level);
        patch(&mut mission.repeatable, self.repeatable);
        patch(&mut mission.repeat_xp_rate, self.repeat_xp_rate);
        patch(&mut mission.pos_x, self.pos_x);
        patch(&mut mission.pos_y, self.pos_y);
        if let Some(mut prerequisites) = self.prerequisites {
            // stored as a set, read back in id order
            prerequisites.sort_unstable();
            prerequisites.dedup();
            mission.prerequisites = prerequisites;
        }
    }
}

pub async fn list_missions(
    State(state): State<AppStateArc>,
    MaybeUser(viewer): MaybeUser,
    Lang(lang): Lang,
) -> ApiResult<Json<Vec<MissionView>>> {
    let conn = state.db().await;
    let ctx = CatalogContext::load(&conn, viewer.as_ref().map(|u| u.id), lang)?;
    Ok(Json(ctx.missions()))
}

pub async fn get_mission(
    State(state): State<AppStateArc>,
    MaybeUser(viewer): MaybeUser,
    Lang(lang): Lang,
    Path(id): Path<MissionId>,
) -> ApiResult<Json<MissionView>> {
    let conn = state.db().await;
    let mission = missions::get(&conn, id)?;
    let ctx = CatalogContext::load(&conn, viewer.as_ref().map(|u| u.id), lang)?;
    Ok(Json(ctx.mission(&mission)))
}

pub async fn create_mission(
    State(state): State<AppStateArc>,
    StaffUser(staff): StaffUser,
    Lang(lang): Lang,
    JsonBody(input): JsonBody<MissionInput>,
) -> ApiResult<(StatusCode, Json<MissionView>)> {
    if input.location.is_none() {
        return Err(ApiError::field("location", "This field is required."));
    }
    required("title", input.title.clone())?;
    let mut mission = Mission::default();
    input.apply(&mut mission);

    let mut conn = state.db().await;
    let tx = conn.transaction()?;
    mission.id = missions::insert(&tx, &mission)?;
    tx.commit()?;
    info!(mission_id = mission.id, by = staff.id, "mission created");

    let ctx = CatalogContext::load(&conn, Some(staff.id), lang)?;
    Ok((StatusCode::CREATED, Json(ctx.mission(&mission))))
}

pub async fn update_mission(
    State(state): State<AppStateArc>,
    StaffUser(staff): StaffUser,
    Lang(lang): Lang,
    Path(id): Path<MissionId>,
    JsonBody(input): JsonBody<MissionInput>,
) -> ApiResult<Json<MissionView>> {
    let mut conn = state.db().await;
    let tx = conn.transaction()?;
    let mut mission = missions::get(&tx, id)?;
    input.apply(&mut mission);
    missions::update(&tx, &mission)?;
    tx.commit()?;

    let ctx = CatalogContext::load(&conn, Some(staff.id), lang)?;
    Ok(Json(ctx.mission(&mission)))
}

pub async fn delete_mission(
    State(state): State<AppStateArc>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<MissionId>,
) -> ApiResult<StatusCode> {
    let conn = state.db().await;
    missions::delete(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a start of mission `id` by the caller.
///
/// Rejects with 400 when the mission is inactive and 403 when the level or
/// prerequisites gate fails.
pub async fn start(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Path(id): Path<MissionId>,
) -> ApiResult<Json<ProgressView>> {
    let mut conn = state.db().await;
    let tx = conn.transaction()?;

    let mission = missions::get(&tx, id)?;
    let profile = profiles::get(&tx, user.id)?;
    let completed = progress::completed_missions(&tx, user.id)?;
    availability::check(&mission, &profile, &completed)?;

    let mut row = progress::find(&tx, user.id, id)?.unwrap_or_else(|| Progress::new(user.id, id));
    lifecycle::start(&mut row, now_secs());
    row.id = progress::save(&tx, &row)?;
    tx.commit()?;

    info!(user_id = user.id, mission_id = id, attempts = row.attempts, "mission started");
    Ok(Json(ProgressView::from(&row)))
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub stars: Option<Value>,
}

/// Accept `stars` as a JSON number or a numeric string; absent means 0.
fn parse_stars(raw: Option<&Value>) -> ApiResult<i64> {
    let invalid = || ApiError::field("stars", "A valid integer is required.");
    match raw {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Record a completion of mission `id` and apply the earned XP.
pub async fn complete(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Path(id): Path<MissionId>,
    OptionalJson(req): OptionalJson<CompleteRequest>,
) -> ApiResult<Json<CompletionView>> {
    let stars = parse_stars(req.stars.as_ref())?;

    let mut conn = state.db().await;
    let tx = conn.transaction()?;

    let mission = missions::get(&tx, id)?;
    let mut profile = profiles::get(&tx, user.id)?;
    let completed = progress::completed_missions(&tx, user.id)?;
    availability::check(&mission, &profile, &completed)?;

    let mut row = progress::find(&tx, user.id, id)?.unwrap_or_else(|| Progress::new(user.id, id));
    let outcome = lifecycle::complete(&mut row, &mission, stars, now_secs());
    row.id = progress::save(&tx, &row)?;

    if outcome.xp_added > 0 {
        let leveled_up = xp::add_xp(&mut profile, outcome.xp_added);
        profiles::save(&tx, &profile)?;
        if leveled_up {
            info!(user_id = user.id, level = profile.level, "level up");
        }
    }
    tx.commit()?;

    info!(
        user_id = user.id,
        mission_id = id,
        xp_added = outcome.xp_added,
        first_time = outcome.first_time,
        "mission completed"
    );
    Ok(Json(CompletionView {
        progress: ProgressView::from(&row),
        xp_added: outcome.xp_added,
        profile_xp: profile.xp,
        profile_level: profile.level,
    }))
}
