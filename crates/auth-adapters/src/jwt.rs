//! HS256 JWT implementation of `TokenService`.
//!
//! Tokens carry `sub` (username), `iat` and `exp`. There is no refresh and no
//! server-side revocation; a token is valid until `exp`.

use chrono::{DateTime, Duration, Utc};
use domains::{DomainError, Result, TokenService, TokenSubject};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

const INVALID_TOKEN: &str = "Could not validate credentials";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, username: &str) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims { sub: username.to_string(), iat: now.timestamp(), exp: expires_at.timestamp() };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(format!("token signing failed: {e}")))?;
        Ok((token, expires_at))
    }

    fn verify(&self, token: &str) -> Result<TokenSubject> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "expired",
                ErrorKind::InvalidSignature => "bad signature",
                _ => "malformed",
            };
            debug!(reason, "bearer token rejected");
            DomainError::Unauthorized(INVALID_TOKEN.into())
        })?;

        let expires_at = DateTime::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| DomainError::Unauthorized(INVALID_TOKEN.into()))?;
        Ok(TokenSubject { username: data.claims.sub, expires_at })
    }
}
