//! The display-only XP ladder.

use axum::extract::{Path, State};
use axum::Json;
use questline_db::queries::ranks;
use questline_types::RankId;

use crate::error::ApiResult;
use crate::extract::Lang;
use crate::state::AppStateArc;
use crate::views::RankView;

pub async fn list_ranks(
    State(state): State<AppStateArc>,
    Lang(lang): Lang,
) -> ApiResult<Json<Vec<RankView>>> {
    let conn = state.db().await;
    let rows = ranks::list(&conn)?;
    Ok(Json(rows.iter().map(|r| RankView::new(r, lang)).collect()))
}

pub async fn get_rank(
    State(state): State<AppStateArc>,
    Lang(lang): Lang,
    Path(id): Path<RankId>,
) -> ApiResult<Json<RankView>> {
    let conn = state.db().await;
    let rank = ranks::get(&conn, id)?;
    Ok(Json(RankView::new(&rank, lang)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use questline_db::queries::ranks;
    use questline_types::catalog::Rank;

    use crate::handlers::test_support::Harness;

    fn rank(slug: &str, order: i64, min_level: u32, min_xp: u64) -> Rank {
        Rank {
            slug: slug.into(),
            title_en: format!("{slug} en"),
            title_ru: format!("{slug} ru"),
            order,
            min_level,
            min_xp,
            ..Rank::default()
        }
    }

    #[tokio::test]
    async fn test_ladder_order_and_language() {
        let h = Harness::new();
        let novice = {
            let conn = h.state.db().await;
            ranks::insert(&conn, &rank("adept", 1, 5, 400)).expect("rank");
            ranks::insert(&conn, &rank("apprentice", 1, 2, 100)).expect("rank");
            ranks::insert(&conn, &rank("novice", 0, 1, 0)).expect("rank")
        };

        let (status, body) = h.send(Method::GET, "/api/ranks?lang=en", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let slugs: Vec<&str> = body
            .as_array()
            .expect("list")
            .iter()
            .map(|r| r["slug"].as_str().expect("slug"))
            .collect();
        assert_eq!(slugs, vec!["novice", "apprentice", "adept"]);
        assert_eq!(body[0]["title"], "novice en");

        let (status, body) = h.send(Method::GET, &format!("/api/ranks/{novice}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "novice ru");
        assert_eq!(body["language"], "ru");

        let (status, _) = h.send(Method::GET, "/api/ranks/404", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
