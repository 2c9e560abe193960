//! Bearer token service
//!
//! Issues and validates HS256 JWTs whose subject is a username. The rest of
//! the crate only sees the [`TokenService`] trait.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

/// Token issuance and validation
pub trait TokenService: Send + Sync {
    /// Issue a token for `username`
    fn issue(&self, username: &str) -> Result<String>;

    /// Subject of a valid token, `None` for a malformed, forged or expired one
    fn subject(&self, token: &str) -> Option<String>;

    fn validate(&self, token: &str) -> bool {
        self.subject(token).is_some()
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub iss: String,
}

/// [`TokenService`] backed by `jsonwebtoken`
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_seconds: i64,
}

impl JwtTokenService {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl_seconds,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.issuer.clone(), config.token_ttl_seconds)
    }

    /// Decode and verify signature, issuer and expiry
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid bearer token")?;
        Ok(data.claims)
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to issue token")
    }

    fn subject(&self, token: &str) -> Option<String> {
        match self.decode_claims(token) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                tracing::debug!("Rejected bearer token: {:#}", e);
                None
            }
        }
    }
}
