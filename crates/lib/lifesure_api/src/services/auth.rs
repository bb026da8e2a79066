//! Authentication service: registration, login and profile lookups for users
//! and administrators, delegating to `lifesure_core::auth`.

use lifesure_core::auth::jwt::{TokenSubject, generate_access_token};
use lifesure_core::auth::password::{hash_password, verify_password};
use lifesure_core::auth::registration::{AdminRegistration, LoginRequest, UserRegistration};
use lifesure_core::auth::AuthError;
use lifesure_core::models::auth::{Admin, Role, User};
use lifesure_core::store::Store;
use lifesure_core::validation;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Signing parameters for issued tokens.
#[derive(Debug, Clone, Copy)]
pub struct TokenSettings<'a> {
    pub secret: &'a [u8],
    pub ttl_secs: i64,
}

fn issue(settings: TokenSettings<'_>, id: &Uuid, email: &str, name: &str, role: Role) -> AppResult<String> {
    let subject = TokenSubject {
        id,
        email,
        name,
        role,
    };
    Ok(generate_access_token(&subject, settings.secret, settings.ttl_secs)?)
}

/// Login fields, normalised. Missing fields fail validation before any lookup.
fn credentials(body: &LoginRequest) -> AppResult<(String, String)> {
    let email = validation::required("email", body.email.as_deref()).map_err(AppError::Validation)?;
    let password = body
        .password
        .clone()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("password is required".into()))?;
    Ok((email.to_lowercase(), password))
}

fn invalid_credentials() -> AppError {
    AppError::from(AuthError::CredentialError)
}

/// Register a policy holder.
pub async fn register_user(store: &dyn Store, body: &UserRegistration) -> AppResult<User> {
    let (new_user, password) = body.validate()?;
    let hash = hash_password(&password)?;
    let user = store.create_user(&new_user, &hash).await?;
    info!(id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Authenticate a policy holder. Unknown email and wrong password fail
/// identically.
pub async fn login_user(
    store: &dyn Store,
    body: &LoginRequest,
    settings: TokenSettings<'_>,
) -> AppResult<(String, User)> {
    let (email, password) = credentials(body)?;
    let account = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&password, &account.password_hash)? {
        return Err(invalid_credentials());
    }
    let user = account.user;
    let token = issue(settings, &user.id, &user.email, &user.name, Role::User)?;
    Ok((token, user))
}

/// Stored profile of the caller.
pub async fn profile(store: &dyn Store, id: &Uuid) -> AppResult<User> {
    store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".into()).into())
}

/// Register an administrator.
pub async fn register_admin(store: &dyn Store, body: &AdminRegistration) -> AppResult<Admin> {
    let (new_admin, password) = body.validate()?;
    let hash = hash_password(&password)?;
    let admin = store.create_admin(&new_admin, &hash).await?;
    info!(id = %admin.id, email = %admin.email, "admin registered");
    Ok(admin)
}

/// Authenticate an administrator.
pub async fn login_admin(
    store: &dyn Store,
    body: &LoginRequest,
    settings: TokenSettings<'_>,
) -> AppResult<(String, Admin)> {
    let (email, password) = credentials(body)?;
    let account = store
        .find_admin_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&password, &account.password_hash)? {
        return Err(invalid_credentials());
    }
    let admin = account.admin;
    let token = issue(settings, &admin.id, &admin.email, &admin.name, Role::Admin)?;
    Ok((token, admin))
}

/// Stored record of the calling administrator.
pub async fn current_admin(store: &dyn Store, id: &Uuid) -> AppResult<Admin> {
    store
        .get_admin_by_id(id)
        .await?
        .ok_or_else(|| AuthError::NotFound("Admin not found".into()).into())
}

/// Every account, users and administrators, newest first.
pub async fn directory(store: &dyn Store) -> AppResult<(Vec<User>, Vec<Admin>)> {
    let users = store.list_users().await?;
    let admins = store.list_admins().await?;
    Ok((users, admins))
}
