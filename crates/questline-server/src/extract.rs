//! Request extractors: caller identity, language and JSON bodies.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION};
use axum::http::request::Parts;
use axum::Json;
use questline_auth::jwt::TokenType;
use questline_auth::now_secs;
use questline_db::queries::users;
use questline_db::DbError;
use questline_types::account::User;
use questline_types::i18n::Language;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppStateArc;

/// An authenticated, active caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// The caller if a valid access token was presented.
///
/// A malformed or expired token still rejects with 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

/// An authenticated staff caller.
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

/// Request language from `?lang=` or `Accept-Language`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lang(pub Language);

/// `axum::Json` with rejections rendered as [`ApiError`].
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

/// A JSON body that may be absent; an empty body yields `T::default()`.
#[derive(Debug, Clone)]
pub struct OptionalJson<T>(pub T);

fn bearer_token(parts: &Parts) -> ApiResult<Option<&str>> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".into()))?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim()))
        }
        _ => Err(ApiError::Unauthorized("Invalid Authorization header".into())),
    }
}

async fn resolve_user(parts: &Parts, state: &AppStateArc) -> ApiResult<Option<User>> {
    let Some(token) = bearer_token(parts)? else {
        return Ok(None);
    };
    let claims = state.keys.decode(token, TokenType::Access, now_secs())?;
    let user_id = claims.user_id()?;
    let conn = state.db().await;
    match users::get(&conn, user_id) {
        Ok(user) if user.is_active => Ok(Some(user)),
        Ok(_) | Err(DbError::NotFound(_)) => {
            Err(ApiError::Unauthorized("User not found or inactive".into()))
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl FromRequestParts<AppStateArc> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppStateArc) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state).await.map(MaybeUser)
    }
}

#[async_trait]
impl FromRequestParts<AppStateArc> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppStateArc) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(AuthUser)
            .ok_or_else(ApiError::unauthenticated)
    }
}

#[async_trait]
impl FromRequestParts<AppStateArc> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppStateArc) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(ApiError::Forbidden(
                "You do not have permission to perform this action.".into(),
            ));
        }
        Ok(StaffUser(user))
    }
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Lang {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = Query::<LangQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.lang);
        let header = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        Ok(Lang(Language::negotiate(query.as_deref(), header)))
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(OptionalJson)
            .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {e}")))
    }
}
