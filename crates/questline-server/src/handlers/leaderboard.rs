use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use questline_db::queries::{leaderboard, profiles, tracks, users};
use questline_db::DbError;
use questline_types::catalog::Track;
use questline_types::{TrackId, ALL_TIME_PERIOD};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::Lang;
use crate::state::AppStateArc;
use crate::views::{LeaderboardView, UserDisplay};

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub track: Option<String>,
    pub scope: Option<String>,
    pub period: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Read the latest snapshot rows. Scope values are matched verbatim.
pub async fn list_leaderboard(
    State(state): State<AppStateArc>,
    Lang(lang): Lang,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Vec<LeaderboardView>>> {
    let filter = leaderboard::Filter {
        track_slug: non_empty(&query.track),
        scope: non_empty(&query.scope),
        period: non_empty(&query.period).unwrap_or(ALL_TIME_PERIOD),
        limit: state.config.leaderboard.max_entries,
    };

    let conn = state.db().await;
    let entries = leaderboard::list(&conn, &filter)?;

    let mut track_cache: HashMap<TrackId, Track> = HashMap::new();
    let mut views = Vec::with_capacity(entries.len());
    for entry in &entries {
        let user = users::get(&conn, entry.user_id)?;
        let profile = match profiles::get(&conn, entry.user_id) {
            Ok(p) => Some(p),
            Err(DbError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let track = match entry.track_id {
            Some(id) => {
                if !track_cache.contains_key(&id) {
                    track_cache.insert(id, tracks::get(&conn, id)?);
                }
                track_cache.get(&id)
            }
            None => None,
        };
        views.push(LeaderboardView::new(
            entry,
            UserDisplay::new(&user, profile.as_ref()),
            track,
            lang,
        ));
    }
    Ok(Json(views))
}
