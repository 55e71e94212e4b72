//! API error type and its HTTP mapping.

use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use questline_auth::AuthError;
use questline_db::DbError;
use questline_engine::EngineError;
use serde_json::json;
use thiserror::Error;

/// Per-field validation messages, rendered as `{"field": ["msg", ...]}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// A single-field validation error.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }

    pub fn not_found() -> Self {
        Self::NotFound("Not found.".into())
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Authentication credentials were not provided.".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                json!({ "detail": "Internal server error." })
            }
            ApiError::BadRequest(detail)
            | ApiError::Unauthorized(detail)
            | ApiError::Forbidden(detail)
            | ApiError::NotFound(detail) => json!({ "detail": detail }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => {
                tracing::debug!(%what, "row not found");
                ApiError::not_found()
            }
            DbError::Constraint(field) => ApiError::field(&field, "Invalid or duplicate value."),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized(
                "No active account found with the given credentials".into(),
            ),
            AuthError::InvalidToken(_)
            | AuthError::Expired
            | AuthError::Blacklisted
            | AuthError::WrongTokenType { .. } => {
                tracing::debug!(error = %err, "token rejected");
                ApiError::Unauthorized("Token is invalid or expired".into())
            }
            AuthError::InvalidUid => ApiError::BadRequest("Invalid uid".into()),
            AuthError::PasswordTooShort { min } => ApiError::field(
                "new_password",
                format!("Ensure this field has at least {min} characters."),
            ),
            AuthError::Hash(message) => ApiError::Internal(message),
            AuthError::Db(db) => db.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MissionInactive { .. } => ApiError::BadRequest("Mission is inactive".into()),
            EngineError::LevelTooLow { .. } => ApiError::Forbidden("Level too low".into()),
            EngineError::PrerequisitesNotCompleted { .. } => {
                ApiError::Forbidden("Prerequisites not completed".into())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::from(DbError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn test_field_error_shape() {
        let (status, body) = render(ApiError::field("username", "Username already taken")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "username": ["Username already taken"] }));
    }

    #[tokio::test]
    async fn test_detail_shape() {
        let (status, body) = render(ApiError::Forbidden("Level too low".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "detail": "Level too low" }));
    }

    #[tokio::test]
    async fn test_internal_hides_message() {
        let (status, body) = render(ApiError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error.");
    }

    #[test]
    fn test_engine_mapping() {
        let inactive = ApiError::from(EngineError::MissionInactive { mission_id: 1 });
        assert_eq!(inactive.status(), StatusCode::BAD_REQUEST);
        let level = ApiError::from(EngineError::LevelTooLow {
            required: 2,
            current: 1,
        });
        assert_eq!(level.status(), StatusCode::FORBIDDEN);
        let prereq = ApiError::from(EngineError::PrerequisitesNotCompleted { missing: vec![1] });
        assert_eq!(prereq.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_db_mapping() {
        assert_eq!(
            ApiError::from(DbError::NotFound("mission".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DbError::Constraint("slug".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DbError::Migration("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_mapping() {
        assert_eq!(
            ApiError::from(AuthError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidUid).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
