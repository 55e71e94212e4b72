//! Accounts: registration, tokens, email verification and password reset.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use questline_auth::email_token::{self, Purpose};
use questline_auth::jwt::TokenPair;
use questline_auth::session::{self, Refreshed};
use questline_auth::{now_secs, password, AuthError};
use questline_db::queries::{profiles, users};
use questline_db::DbError;
use questline_types::account::User;
use questline_types::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::required;
use crate::error::{ApiError, ApiResult};
use crate::extract::{AuthUser, JsonBody};
use crate::mail::Mail;
use crate::state::{AppState, AppStateArc};
use crate::views::MeView;

const RESET_REQUESTED: &str = "If the email exists, a reset link will be sent.";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

pub async fn register(
    State(state): State<AppStateArc>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisteredUser>)> {
    let username = required("username", req.username)?.trim().to_string();
    let raw_password = required("password", req.password)?;
    let email = req.email.unwrap_or_default().trim().to_string();
    if !email.is_empty() && !looks_like_email(&email) {
        return Err(ApiError::field("email", "Enter a valid email address."));
    }

    let hash = password::hash_password(&raw_password)?;
    let now = now_secs();

    let user = {
        let mut conn = state.db().await;
        if users::username_exists(&conn, &username)? {
            return Err(taken());
        }
        let tx = conn.transaction()?;
        let id = match users::insert(
            &tx,
            &users::NewUser {
                username: &username,
                email: &email,
                display_name: "",
                password_hash: &hash,
                is_active: true,
                is_staff: false,
            },
            now,
        ) {
            Ok(id) => id,
            Err(DbError::Constraint(_)) => return Err(taken()),
            Err(e) => return Err(e.into()),
        };
        profiles::insert(&tx, id)?;
        let user = users::get(&tx, id)?;
        tx.commit()?;
        user
    };
    info!(user_id = user.id, "user registered");

    if !user.email.is_empty() {
        queue_link_mail(
            &state,
            &user,
            Purpose::VerifyEmail,
            "/api/auth/verify-email/",
            "Verify your email",
            "Click",
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

fn taken() -> ApiError {
    ApiError::field("username", "Username already taken")
}

fn looks_like_email(raw: &str) -> bool {
    match raw.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Issue a one-time token for `user` and mail a link carrying it.
fn queue_link_mail(
    state: &AppState,
    user: &User,
    purpose: Purpose,
    path: &str,
    subject: &str,
    lead: &str,
) {
    let ttl = state.config.auth.email_token_ttl_secs();
    let token = match email_token::issue(&state.keys, user, purpose, ttl, now_secs()) {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(user_id = user.id, error = %e, "could not issue mail token");
            return;
        }
    };
    let uid = email_token::encode_uid(user.id);
    let link = state.link(&format!("{path}?uid={uid}&token={token}"));
    state.send_mail(Mail {
        to: user.email.clone(),
        subject: subject.to_string(),
        body: format!("{lead}: {link}"),
    });
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<AppStateArc>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let username = required("username", req.username)?;
    let password = required("password", req.password)?;
    let conn = state.db().await;
    let pair = session::login(&conn, &state.keys, &username, &password, now_secs())?;
    Ok(Json(pair))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

pub async fn refresh(
    State(state): State<AppStateArc>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> ApiResult<Json<Refreshed>> {
    let token = required("refresh", req.refresh)?;
    let conn = state.db().await;
    let refreshed = session::refresh(
        &conn,
        &state.keys,
        &token,
        state.config.auth.rotate_refresh_tokens,
        now_secs(),
    )?;
    Ok(Json(refreshed))
}

pub async fn logout(
    State(state): State<AppStateArc>,
    AuthUser(_user): AuthUser,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> ApiResult<StatusCode> {
    let Some(token) = req.refresh.filter(|t| !t.is_empty()) else {
        return Err(ApiError::BadRequest("Refresh token required.".into()));
    };
    let conn = state.db().await;
    match session::logout(&conn, &state.keys, &token, now_secs()) {
        Ok(()) => Ok(StatusCode::RESET_CONTENT),
        Err(AuthError::Db(e)) => Err(e.into()),
        Err(e) => Err(ApiError::BadRequest(e.to_string())),
    }
}

pub async fn me(State(state): State<AppStateArc>, AuthUser(user): AuthUser) -> ApiResult<Json<MeView>> {
    let conn = state.db().await;
    let profile = profiles::get(&conn, user.id)?;
    Ok(Json(MeView::new(&user, &profile)))
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub uid: Option<String>,
    pub token: Option<String>,
}

pub async fn verify_email(
    State(state): State<AppStateArc>,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<Json<Value>> {
    let (Some(uid), Some(token)) = (
        query.uid.filter(|v| !v.is_empty()),
        query.token.filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Missing uid or token".into()));
    };

    let conn = state.db().await;
    let user = user_for_uid(&conn, &uid).map_err(|_| ApiError::BadRequest("Invalid uid".into()))?;
    if email_token::check(&state.keys, &user, Purpose::VerifyEmail, &token, now_secs()).is_err() {
        return Err(ApiError::BadRequest("Invalid token".into()));
    }
    users::mark_email_verified(&conn, user.id)?;
    info!(user_id = user.id, "email verified");
    Ok(Json(json!({ "detail": "Email verified" })))
}

fn user_for_uid(conn: &rusqlite::Connection, uid: &str) -> ApiResult<User> {
    let user_id = email_token::decode_uid(uid)?;
    Ok(users::get(conn, user_id)?)
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

pub async fn password_reset(
    State(state): State<AppStateArc>,
    JsonBody(req): JsonBody<PasswordResetRequest>,
) -> ApiResult<Json<Value>> {
    let email = required("email", req.email)?.trim().to_string();
    if !looks_like_email(&email) {
        return Err(ApiError::field("email", "Enter a valid email address."));
    }

    let user = {
        let conn = state.db().await;
        users::find_by_email(&conn, &email)?
    };
    if let Some(user) = user {
        queue_link_mail(
            &state,
            &user,
            Purpose::PasswordReset,
            "/reset-password-confirm/",
            "Password reset",
            "Reset link",
        );
    }
    Ok(Json(json!({ "detail": RESET_REQUESTED })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub uid: Option<String>,
    pub token: Option<String>,
    pub new_password: Option<String>,
}

pub async fn password_reset_confirm(
    State(state): State<AppStateArc>,
    JsonBody(req): JsonBody<PasswordResetConfirm>,
) -> ApiResult<Json<Value>> {
    let uid = required("uid", req.uid)?;
    let token = required("token", req.token)?;
    let new_password = required("new_password", req.new_password)?;
    password::validate_new_password(&new_password)?;

    let hash = password::hash_password(&new_password)?;

    // token check and write share one guard so a token is spent exactly once
    let mut conn = state.db().await;
    let tx = conn.transaction()?;
    let user = user_for_uid(&tx, &uid)
        .map_err(|_| ApiError::field("non_field_errors", "Invalid uid"))?;
    if email_token::check(&state.keys, &user, Purpose::PasswordReset, &token, now_secs()).is_err() {
        return Err(ApiError::field("non_field_errors", "Invalid token"));
    }
    users::set_password(&tx, user.id, &hash)?;
    tx.commit()?;
    info!(user_id = user.id, "password reset");
    Ok(Json(json!({ "detail": "Password has been reset." })))
}
