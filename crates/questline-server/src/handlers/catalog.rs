//! Tracks and locations.
//!
//! Reads are public; writes need a staff account.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use questline_db::queries::{locations, tracks};
use questline_types::account::User;
use questline_types::catalog::{Location, Track};
use questline_types::i18n::Language;
use questline_types::{LocationId, TrackId};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::info;

use super::{nullable, patch, required};
use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, Lang, MaybeUser, StaffUser};
use crate::state::AppStateArc;
use crate::views::{CatalogContext, LocationView, TrackView};

#[derive(Debug, Default, Deserialize)]
pub struct TrackInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub title_en: Option<String>,
    pub title_ru: Option<String>,
    pub description_en: Option<String>,
    pub description_ru: Option<String>,
    pub tagline_en: Option<String>,
    pub tagline_ru: Option<String>,
    pub icon_url: Option<String>,
    pub banner_url: Option<String>,
    pub color_theme: Option<String>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
    pub is_premium: Option<bool>,
    pub default_language: Option<String>,
}

impl TrackInput {
    fn apply(self, track: &mut Track) {
        patch(&mut track.slug, self.slug);
        patch(&mut track.title, self.title);
        patch(&mut track.description, self.description);
        patch(&mut track.title_en, self.title_en);
        patch(&mut track.title_ru, self.title_ru);
        patch(&mut track.description_en, self.description_en);
        patch(&mut track.description_ru, self.description_ru);
        patch(&mut track.tagline_en, self.tagline_en);
        patch(&mut track.tagline_ru, self.tagline_ru);
        patch(&mut track.icon_url, self.icon_url);
        patch(&mut track.banner_url, self.banner_url);
        patch(&mut track.color_theme, self.color_theme);
        patch(&mut track.order, self.order);
        patch(&mut track.is_active, self.is_active);
        patch(&mut track.is_premium, self.is_premium);
        patch(&mut track.default_language, self.default_language);
    }
}

fn render_track(
    conn: &Connection,
    viewer: Option<&User>,
    lang: Language,
    track: &Track,
) -> ApiResult<TrackView> {
    let ctx = CatalogContext::load(conn, viewer.map(|u| u.id), lang)?;
    let worlds = locations::list(conn, Some(track.id))?;
    Ok(ctx.track(track, &worlds))
}

pub async fn list_tracks(
    State(state): State<AppStateArc>,
    MaybeUser(viewer): MaybeUser,
    Lang(lang): Lang,
) -> ApiResult<Json<Vec<TrackView>>> {
    let conn = state.db().await;
    let ctx = CatalogContext::load(&conn, viewer.as_ref().map(|u| u.id), lang)?;
    let worlds = locations::list(&conn, None)?;
    let views = tracks::list(&conn, true)?
        .iter()
        .map(|t| ctx.track(t, &worlds))
        .collect();
    Ok(Json(views))
}

pub async fn get_track(
    State(state): State<AppStateArc>,
    MaybeUser(viewer): MaybeUser,
    Lang(lang): Lang,
    Path(id): Path<TrackId>,
) -> ApiResult<Json<TrackView>> {
    let conn = state.db().await;
    let track = tracks::get(&conn, id)?;
    if !track.is_active {
        return Err(ApiError::not_found());
    }
    Ok(Json(render_track(&conn, viewer.as_ref(), lang, &track)?))
}

pub async fn create_track(
    State(state): State<AppStateArc>,
    StaffUser(staff): StaffUser,
    Lang(lang): Lang,
    JsonBody(input): JsonBody<TrackInput>,
) -> ApiResult<(StatusCode, Json<TrackView>)> {
    let slug = required("slug", input.slug.clone())?;
    required("title", input.title.clone())?;
    let mut track = Track {
        is_active: true,
        default_language: "ru".into(),
        ..Track::default()
    };
    input.apply(&mut track);

    let conn = state.db().await;
    track.id = tracks::insert(&conn, &track)?;
    info!(track_id = track.id, %slug, by = staff.id, "track created");
    Ok((
        StatusCode::CREATED,
        Json(render_track(&conn, Some(&staff), lang, &track)?),
    ))
}

pub async fn update_track(
    State(state): State<AppStateArc>,
    StaffUser(staff): StaffUser,
    Lang(lang): Lang,
    Path(id): Path<TrackId>,
    JsonBody(input): JsonBody<TrackInput>,
) -> ApiResult<Json<TrackView>> {
    let conn = state.db().await;
    let mut track = tracks::get(&conn, id)?;
    input.apply(&mut track);
    tracks::update(&conn, &track)?;
    Ok(Json(render_track(&conn, Some(&staff), lang, &track)?))
}

pub async fn delete_track(
    State(state): State<AppStateArc>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<TrackId>,
) -> ApiResult<StatusCode> {
    let conn = state.db().await;
    tracks::delete(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationInput {
    #[serde(default, deserialize_with = "nullable")]
    pub track: Option<Option<TrackId>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub title_en: Option<String>,
    pub title_ru: Option<String>,
    pub description_en: Option<String>,
    pub description_ru: Option<String>,
    pub order: Option<i64>,
}

impl LocationInput {
    fn apply(self, location: &mut Location) {
        patch(&mut location.track_id, self.track);
        patch(&mut location.title, self.title);
        patch(&mut location.description, self.description);
        patch(&mut location.title_en, self.title_en);
        patch(&mut location.title_ru, self.title_ru);
        patch(&mut location.description_en, self.description_en);
        patch(&mut location.description_ru, self.description_ru);
        patch(&mut location.order, self.order);
    }
}

pub async fn list_locations(
    State(state): State<AppStateArc>,
    MaybeUser(viewer): MaybeUser,
    Lang(lang): Lang,
) -> ApiResult<Json<Vec<LocationView>>> {
    let conn = state.db().await;
    let ctx = CatalogContext::load(&conn, viewer.as_ref().map(|u| u.id), lang)?;
    let views = locations::list(&conn, None)?
        .iter()
        .map(|l| ctx.location(l))
        .collect();
    Ok(Json(views))
}

pub async fn get_location(
    State(state): State<AppStateArc>,
    MaybeUser(viewer): MaybeUser,
    Lang(lang): Lang,
    Path(id): Path<LocationId>,
) -> ApiResult<Json<LocationView>> {
    let conn = state.db().await;
    let location = locations::get(&conn, id)?;
    let ctx = CatalogContext::load(&conn, viewer.as_ref().map(|u| u.id), lang)?;
    Ok(Json(ctx.location(&location)))
}

pub async fn create_location(
    State(state): State<AppStateArc>,
    StaffUser(staff): StaffUser,
    Lang(lang): Lang,
    JsonBody(input): JsonBody<LocationInput>,
) -> ApiResult<(StatusCode, Json<LocationView>)> {
    required("title", input.title.clone())?;
    let mut location = Location::default();
    input.apply(&mut location);

    let conn = state.db().await;
    location.id = locations::insert(&conn, &location)?;
    info!(location_id = location.id, by = staff.id, "location created");
    let ctx = CatalogContext::load(&conn, Some(staff.id), lang)?;
    Ok((StatusCode::CREATED, Json(ctx.location(&location))))
}

pub async fn update_location(
    State(state): State<AppStateArc>,
    StaffUser(staff): StaffUser,
    Lang(lang): Lang,
    Path(id): Path<LocationId>,
    JsonBody(input): JsonBody<LocationInput>,
) -> ApiResult<Json<LocationView>> {
    let conn = state.db().await;
    let mut location = locations::get(&conn, id)?;
    input.apply(&mut location);
    locations::update(&conn, &location)?;
    let ctx = CatalogContext::load(&conn, Some(staff.id), lang)?;
    Ok(Json(ctx.location(&location)))
}

pub async fn delete_location(
    State(state): State<AppStateArc>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<LocationId>,
) -> ApiResult<StatusCode> {
    let conn = state.db().await;
    locations::delete(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use questline_db::queries::tracks;
    use questline_db::seed;
    use serde_json::json;

    use crate::handlers::test_support::Harness;

    #[tokio::test]
    async fn test_list_tracks_nested_and_localized() {
        let h = Harness::new();
        {
            let conn = h.state.db().await;
            seed::load_demo_content(&conn).expect("seed");
        }
        let (status, body) = h.send(Method::GET, "/api/tracks/?lang=ru", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let track = &body[0];
        assert_eq!(track["slug"], seed::DEMO_TRACK_SLUG);
        assert_eq!(track["title"], "Путь Python");
        assert_eq!(track["language"], "ru");
        assert_eq!(track["worlds"].as_array().expect("worlds").len(), 2);
        assert_eq!(track["worlds"][0]["title"], "Мир 1: Основы Python");
        assert_eq!(track["worlds"][0]["missions"][0]["title"], "Интродукция");

        let (_, body) = h.send(Method::GET, "/api/tracks?lang=en", None, None).await;
        assert_eq!(body[0]["worlds"][0]["title"], "World 1");
    }

    #[tokio::test]
    async fn test_accept_language_header_fallback() {
        let h = Harness::new();
        {
            let conn = h.state.db().await;
            seed::load_demo_content(&conn).expect("seed");
        }
        let request = axum::http::Request::builder()
            .uri("/api/locations")
            .header("accept-language", "en-US,en;q=0.9")
            .body(axum::body::Body::empty())
            .expect("request");
        let response = tower::ServiceExt::oneshot(crate::routes::app(h.state.clone()), request)
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .expect("body")
            .to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body[0]["language"], "en");
        assert_eq!(body[0]["track"]["slug"], seed::DEMO_TRACK_SLUG);
    }

    #[tokio::test]
    async fn test_inactive_tracks_hidden() {
        let h = Harness::new();
        let demo = {
            let conn = h.state.db().await;
            let demo = seed::load_demo_content(&conn).expect("seed");
            let mut track = tracks::get(&conn, demo.track).expect("track");
            track.is_active = false;
            tracks::update(&conn, &track).expect("update");
            demo
        };
        let (_, body) = h.send(Method::GET, "/api/tracks", None, None).await;
        assert_eq!(body, json!([]));
        let (status, _) = h
            .send(Method::GET, &format!("/api/tracks/{}", demo.track), None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_track_writes_need_staff() {
        let h = Harness::new();
        let learner = h.user("ada", false).await;
        let token = h.token(learner);
        let body = json!({ "slug": "rust-road", "title": "Rust Road" });

        let (status, _) = h.send(Method::POST, "/api/tracks", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = h
            .send(Method::POST, "/api/tracks", Some(&token), Some(body))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_track_and_location_crud() {
        let h = Harness::new();
        let admin = h.user("admin", true).await;
        let token = h.token(admin);

        let (status, track) = h
            .send(
                Method::POST,
                "/api/tracks/",
                Some(&token),
                Some(json!({ "slug": "rust-road", "title": "Rust Road", "tagline_en": "Borrow wisely" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(track["is_active"], true);
        assert_eq!(track["tagline"], "Borrow wisely");
        let track_id = track["id"].as_i64().expect("id");

        let (status, _) = h
            .send(
                Method::POST,
                "/api/tracks",
                Some(&token),
                Some(json!({ "slug": "rust-road", "title": "Again" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, location) = h
            .send(
                Method::POST,
                "/api/locations",
                Some(&token),
                Some(json!({ "title": "Crate Harbor", "track": track_id, "order": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(location["track"]["id"], track_id);
        let location_id = location["id"].as_i64().expect("id");

        let (status, location) = h
            .send(
                Method::PATCH,
                &format!("/api/locations/{location_id}"),
                Some(&token),
                Some(json!({ "track": null })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(location["track"].is_null());
        assert_eq!(location["title"], "Crate Harbor");

        let (status, track) = h
            .send(
                Method::PATCH,
                &format!("/api/tracks/{track_id}"),
                Some(&token),
                Some(json!({ "title_ru": "Дорога Rust" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(track["title"], "Дорога Rust");

        let (status, _) = h
            .send(Method::DELETE, &format!("/api/tracks/{track_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = h
            .send(Method::DELETE, &format!("/api/tracks/{track_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_track_requires_slug() {
        let h = Harness::new();
        let admin = h.user("admin", true).await;
        let token = h.token(admin);
        let (status, body) = h
            .send(Method::POST, "/api/tracks", Some(&token), Some(json!({ "title": "No slug" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["slug"][0], "This field is required.");
    }
}
