//! HS256 token codec.
//!
//! Encoding/decoding is isolated here so the rest of the application only
//! sees [`Claims`]; the deterministic time-window checks live in
//! [`crate::claims::validate_claims`].

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storekeep_core::UserId;

use crate::claims::{validate_claims, Claims, TokenValidationError};
use crate::roles::Role;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encode(String),

    #[error("token is malformed or has a bad signature")]
    Invalid,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Wire-format claims as serialized into the JWT payload.
///
/// Kept separate from [`Claims`] because the JWT registered claims use
/// unix-second integers, not RFC 3339 timestamps.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: UserId,
    role: Role,
    iat: i64,
    exp: i64,
}

/// HS256 signer/verifier over a shared secret.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a token for `claims`.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        let wire = WireClaims {
            sub: claims.sub,
            role: claims.role,
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        };
        encode(&Header::default(), &wire, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify signature and time window, returning the decoded claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        // Expiry is enforced by validate_claims against the supplied clock,
        // so the decoder's own exp check (which reads the system clock) is
        // disabled.
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<WireClaims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        let claims = Claims {
            sub: data.claims.sub,
            role: data.claims.role,
            issued_at: timestamp(data.claims.iat)?,
            expires_at: timestamp(data.claims.exp)?,
        };
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(secs, 0).single().ok_or(TokenError::Invalid)
}
