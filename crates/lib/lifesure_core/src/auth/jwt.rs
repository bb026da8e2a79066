//! JWT token generation and verification.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{Role, TokenClaims};

/// Default access token lifetime for both roles: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Identity embedded in an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject<'a> {
    pub id: &'a Uuid,
    pub email: &'a str,
    pub name: &'a str,
    pub role: Role,
}

/// Generate a signed HS256 access token valid for `ttl_secs`.
pub fn generate_access_token(
    subject: &TokenSubject<'_>,
    secret: &[u8],
    ttl_secs: i64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: subject.id.to_string(),
        id: subject.id.to_string(),
        email: subject.email.to_string(),
        name: subject.name.to_string(),
        role: subject.role,
        is_admin: subject.role == Role::Admin,
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify an access token, returning the claims on success.
///
/// Expired and badly signed tokens are distinguished only in the message.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                AuthError::TokenError("Token has expired. Please login again.".into())
            }
            _ => AuthError::TokenError("Invalid token. Please login again.".into()),
        })
}

/// Resolve the JWT secret: configured value → persisted file → generated.
///
/// A generated secret is random and persisted, so there is never a
/// guessable built-in fallback.
pub fn resolve_jwt_secret(configured: Option<&str>) -> String {
    if let Some(secret) = configured.map(str::trim)
        && !secret.is_empty()
    {
        return secret.to_string();
    }
    load_or_create_secret(&jwt_secret_path())
}

/// Read the secret stored at `path`, generating and persisting one if absent.
fn load_or_create_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret = random_secret();
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path = %parent.display(), "could not create secret directory: {e}");
    }
    match std::fs::write(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        Err(e) => warn!(
            path = %path.display(),
            "generated JWT secret could not be persisted, tokens will not survive a restart: {e}"
        ),
    }
    secret
}

/// 64 random alphanumeric characters.
pub fn random_secret() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lifesure")
        .join("jwt-secret")
}
