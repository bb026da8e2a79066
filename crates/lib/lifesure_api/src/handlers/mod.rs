//! Request handlers.

pub mod admin;
pub mod admin_claims;
pub mod auth;
pub mod claims;
pub mod health;
pub mod policies;

use uuid::Uuid;

use crate::error::AppError;

/// Parse a path id. Malformed ids cannot name a record, so they are
/// reported as missing.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{what} not found")))
}
