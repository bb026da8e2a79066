//! Authentication and credential storage.
//!
//! Provides password hashing, JWT management, registration validation and
//! the credential store contract shared by the API layer.

pub mod jwt;
pub mod password;
pub mod queries;
pub mod registration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{Admin, AdminWithPassword, NewAdmin, NewUser, User, UserWithPassword};

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence for user and administrator accounts.
///
/// Emails are stored lower-cased; `create_*` fails with
/// [`AuthError::Conflict`] when the email is already registered.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError>;

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AuthError>;

    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<User, AuthError>;

    async fn list_users(&self) -> Result<Vec<User>, AuthError>;

    async fn find_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AdminWithPassword>, AuthError>;

    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<Admin>, AuthError>;

    async fn create_admin(&self, admin: &NewAdmin, password_hash: &str)
    -> Result<Admin, AuthError>;

    async fn list_admins(&self) -> Result<Vec<Admin>, AuthError>;
}
