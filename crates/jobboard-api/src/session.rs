//! Session token codec.
//!
//! Tokens are HS256 JWTs carrying the identity submitted at login (at least
//! an `email`) plus `iat`/`exp`. They expire five hours after issue.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jobboard_models::Fields;

/// Validity window of a session token.
pub const SESSION_TTL_SECS: i64 = 5 * 60 * 60;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("identity must include an email")]
    MissingEmail,

    #[error("session token expired")]
    ExpiredToken,

    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("failed to sign session token: {0}")]
    Signing(String),
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    /// Any other identity fields submitted at login.
    #[serde(flatten)]
    pub extra: Fields,
}

/// Issues and verifies session tokens with a server-held secret.
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for the given identity, valid from now.
    pub fn issue(&self, identity: Fields) -> Result<String, SessionError> {
        self.issue_at(identity, Utc::now().timestamp())
    }

    /// Sign a token as if issued at `issued_at` (unix seconds).
    pub fn issue_at(&self, mut identity: Fields, issued_at: i64) -> Result<String, SessionError> {
        let email = match identity.remove("email") {
            Some(serde_json::Value::String(email)) if !email.trim().is_empty() => email,
            _ => return Err(SessionError::MissingEmail),
        };
        identity.remove("iat");
        identity.remove("exp");

        let claims = SessionClaims {
            email,
            iat: issued_at,
            exp: issued_at + SESSION_TTL_SECS,
            extra: identity,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    /// Decode a token, checking signature and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::ExpiredToken,
                _ => SessionError::InvalidToken(e.to_string()),
            })
    }
}
