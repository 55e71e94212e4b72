//! One-time tokens for email verification and password reset links.
//!
//! A link carries `uid` (URL-safe base64 of the user id) and a signed token.
//! The token embeds a fingerprint of the account state it was issued for:
//! resetting the password or verifying the email changes that state, which
//! spends every outstanding token of that purpose.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use questline_types::account::User;
use questline_types::UserId;

use crate::jwt::JwtKeys;
use crate::{AuthError, Result};

/// Key derivation context for the fingerprint MAC.
const FINGERPRINT_CONTEXT: &str = "Questline v1 one-time-token fingerprint";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    VerifyEmail,
    PasswordReset,
}

#[derive(Debug, Serialize, Deserialize)]
struct OneTimeClaims {
    sub: String,
    exp: u64,
    iat: u64,
    purpose: Purpose,
    fp: String,
}

/// Encode a user id for a link.
pub fn encode_uid(user_id: UserId) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string())
}

/// Decode the `uid` of a link. Padded input is accepted.
pub fn decode_uid(uid: &str) -> Result<UserId> {
    let bytes = URL_SAFE_NO_PAD
        .decode(uid.trim_end_matches('='))
        .map_err(|_| AuthError::InvalidUid)?;
    std::str::from_utf8(&bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(AuthError::InvalidUid)
}

fn fingerprint(keys: &JwtKeys, user: &User, purpose: Purpose) -> String {
    let key = blake3::derive_key(FINGERPRINT_CONTEXT, keys.secret());
    let state = format!(
        "{}|{:?}|{}|{}|{}",
        user.id,
        purpose,
        user.password_hash,
        user.email_verified,
        user.last_login.unwrap_or(0)
    );
    blake3::keyed_hash(&key, state.as_bytes()).to_hex().to_string()
}

/// Issue a token for `user` valid for `ttl_secs`.
pub fn issue(keys: &JwtKeys, user: &User, purpose: Purpose, ttl_secs: u64, now: u64) -> Result<String> {
    keys.sign(&OneTimeClaims {
        sub: user.id.to_string(),
        exp: now.saturating_add(ttl_secs),
        iat: now,
        purpose,
        fp: fingerprint(keys, user, purpose),
    })
}

/// Check a token against the user's current state.
pub fn check(keys: &JwtKeys, user: &User, purpose: Purpose, token: &str, now: u64) -> Result<()> {
    let claims: OneTimeClaims = keys.verify(token)?;
    if claims.purpose != purpose || claims.sub != user.id.to_string() {
        return Err(AuthError::InvalidToken("token does not match this link".into()));
    }
    if claims.exp <= now {
        return Err(AuthError::Expired);
    }
    if claims.fp != fingerprint(keys, user, purpose) {
        return Err(AuthError::InvalidToken("token already used".into()));
    }
    Ok(())
}
