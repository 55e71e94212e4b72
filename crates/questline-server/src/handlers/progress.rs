//! The caller's mission progress rows (read-only).

use axum::extract::{Path, State};
use axum::Json;
use questline_db::queries::progress;

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppStateArc;
use crate::views::ProgressView;

pub async fn list_progress(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ProgressView>>> {
    let conn = state.db().await;
    let rows = progress::list_for_user(&conn, user.id)?;
    Ok(Json(rows.iter().map(ProgressView::from).collect()))
}

pub async fn get_progress(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProgressView>> {
    let conn = state.db().await;
    let row = progress::get(&conn, user.id, id)?;
    Ok(Json(ProgressView::from(&row)))
}
