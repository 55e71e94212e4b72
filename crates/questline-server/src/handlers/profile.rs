//! The caller's profile and class roles.

use axum::extract::State;
use axum::Json;
use questline_db::queries::{class_roles, profiles};
use questline_db::DbError;
use questline_types::profile::ClassRole;
use questline_types::ClassRoleId;
use serde::Deserialize;
use tracing::info;

use super::{nullable, patch};
use crate::error::{ApiError, ApiResult};
use crate::extract::{AuthUser, JsonBody};
use crate::state::AppStateArc;
use crate::views::ProfileView;

const ROLE_LOCKED: &str = "Class role can be selected only once for this profile.";

/// Partial profile update. `xp` and `level` are not writable here.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub class_role: Option<Option<ClassRoleId>>,
}

pub async fn get_profile(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ProfileView>> {
    let conn = state.db().await;
    let profile = profiles::get(&conn, user.id)?;
    Ok(Json(ProfileView::from(&profile)))
}

pub async fn patch_profile(
    State(state): State<AppStateArc>,
    AuthUser(user): AuthUser,
    JsonBody(req): JsonBody<ProfilePatch>,
) -> ApiResult<Json<ProfileView>> {
    let conn = state.db().await;
    let mut profile = profiles::get(&conn, user.id)?;

    if let Some(requested) = req.class_role {
        if let Some(id) = requested {
            match class_roles::get(&conn, id) {
                Ok(_) => {}
                Err(DbError::NotFound(_)) => {
                    return Err(ApiError::field(
                        "class_role",
                        format!("Invalid pk \"{id}\" - object does not exist."),
                    ))
                }
                Err(e) => return Err(e.into()),
            }
        }
        // once chosen, only a repeat of the same role is accepted
        if profile.class_role.is_some() && requested != profile.class_role {
            return Err(ApiError::field("class_role", ROLE_LOCKED));
        }
        if profile.class_role.is_none() && requested.is_some() {
            info!(user_id = user.id, class_role = ?requested, "class role chosen");
        }
        profile.class_role = requested;
    }
    patch(&mut profile.bio, req.bio);

    profiles::save(&conn, &profile)?;
    Ok(Json(ProfileView::from(&profile)))
}

pub async fn list_class_roles(State(state): State<AppStateArc>) -> ApiResult<Json<Vec<ClassRole>>> {
    let conn = state.db().await;
    Ok(Json(class_roles::list(&conn)?))
}
