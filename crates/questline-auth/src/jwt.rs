//! HS256 access and refresh tokens.
//!
//! Expiry is checked against a caller-supplied `now`.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use questline_types::UserId;

use crate::{AuthError, Result};

/// Which half of a token pair a JWT is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Registered and private claims of a Questline token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, decimal.
    pub sub: String,
    pub exp: u64,
    pub iat: u64,
    /// Random token id, hex. Blacklist key.
    pub jti: String,
    pub token_type: TokenType,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".into()))
    }
}

/// A freshly issued access/refresh pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing keys and token lifetimes.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    secret: Vec<u8>,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl JwtKeys {
    pub fn new(secret: &[u8], access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            secret: secret.to_vec(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Keys from a random 32-byte secret. Tokens do not survive a restart.
    pub fn random(access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        let secret: [u8; 32] = rand::random();
        Self::new(&secret, access_ttl_secs, refresh_ttl_secs)
    }

    /// Raw secret, for deriving other purpose-bound keys.
    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Sign arbitrary claims with the HS256 key.
    pub(crate) fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Verify the signature and decode claims, without checking expiry.
    pub(crate) fn verify<T: serde::de::DeserializeOwned>(&self, token: &str) -> Result<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Issue one token of the given type.
    pub fn issue(&self, user_id: UserId, token_type: TokenType, now: u64) -> Result<(String, Claims)> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl_secs,
            TokenType::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now.saturating_add(ttl),
            iat: now,
            jti: hex::encode(rand::random::<[u8; 16]>()),
            token_type,
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    /// Issue an access/refresh pair.
    pub fn pair(&self, user_id: UserId, now: u64) -> Result<TokenPair> {
        let (access, _) = self.issue(user_id, TokenType::Access, now)?;
        let (refresh, _) = self.issue(user_id, TokenType::Refresh, now)?;
        Ok(TokenPair { access, refresh })
    }

    /// Decode a token, requiring it to be of `expected` type and unexpired at `now`.
    pub fn decode(&self, token: &str, expected: TokenType, now: u64) -> Result<Claims> {
        let claims: Claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType {
                expected: expected.as_str(),
            });
        }
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}
