//! # questline-auth
//!
//! Account credentials and tokens for the Questline server.
//!
//! ## Modules
//!
//! - [`password`]: Argon2id password hashing (PHC strings)
//! - [`jwt`]: HS256 access/refresh tokens
//! - [`session`]: login, refresh rotation and logout against the blacklist
//! - [`email_token`]: one-time email verification and password reset tokens

pub mod email_token;
pub mod jwt;
pub mod password;
pub mod session;

/// Authentication error types.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Argon2id hashing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// Unknown user, wrong password or inactive account.
    #[error("no active account found with the given credentials")]
    InvalidCredentials,

    /// Token failed to decode or its signature did not match.
    #[error("token is invalid: {0}")]
    InvalidToken(String),

    /// Token `exp` is in the past.
    #[error("token has expired")]
    Expired,

    /// Refresh token was rotated out or logged out.
    #[error("token is blacklisted")]
    Blacklisted,

    /// An access token was presented where a refresh token was expected, or vice versa.
    #[error("wrong token type: expected {expected}")]
    WrongTokenType { expected: &'static str },

    /// The uid part of a verification or reset link did not decode.
    #[error("invalid uid")]
    InvalidUid,

    /// New password below the minimum length.
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error(transparent)]
    Db(#[from] questline_db::DbError),
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// Current Unix time in seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
