//! Credential queries for the PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{AuthError, CredentialStore};
use crate::models::auth::{Admin, AdminWithPassword, NewAdmin, NewUser, User, UserWithPassword};
use crate::store::{PgStore, is_unique_violation};
use crate::uuid::uuidv7;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, phone, gender, dob, city, state, pin_code, created_at";

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, phone_number, created_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    phone: String,
    gender: String,
    dob: NaiveDate,
    city: String,
    state: String,
    pin_code: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserWithPassword {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserWithPassword {
            user: User {
                id: row.id,
                name: row.name,
                email: row.email,
                phone: row.phone,
                gender: row.gender.parse().map_err(AuthError::Internal)?,
                dob: row.dob,
                city: row.city,
                state: row.state,
                pin_code: row.pin_code,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    phone_number: String,
    created_at: DateTime<Utc>,
}

impl From<AdminRow> for AdminWithPassword {
    fn from(row: AdminRow) -> Self {
        AdminWithPassword {
            admin: Admin {
                id: row.id,
                name: row.name,
                email: row.email,
                phone_number: row.phone_number,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        }
    }
}

fn map_insert_error(e: sqlx::Error, what: &str) -> AuthError {
    if is_unique_violation(&e) {
        AuthError::Conflict(format!("{what} already exists with this email"))
    } else {
        AuthError::DbError(e)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        row.map(UserWithPassword::try_from).transpose()
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row
            .map(UserWithPassword::try_from)
            .transpose()?
            .map(|u| u.user))
    }

    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, email, password_hash, phone, gender, dob, city, state, pin_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(&user.name)
        .bind(&user.email)
        .bind(password_hash)
        .bind(&user.phone)
        .bind(user.gender.as_str())
        .bind(user.dob)
        .bind(&user.city)
        .bind(&user.state)
        .bind(&user.pin_code)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_insert_error(e, "User"))?;
        Ok(UserWithPassword::try_from(row)?.user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;
        rows.into_iter()
            .map(|r| UserWithPassword::try_from(r).map(|u| u.user))
            .collect()
    }

    async fn find_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AdminWithPassword>, AuthError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(AdminWithPassword::from))
    }

    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<Admin>, AuthError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|r| AdminWithPassword::from(r).admin))
    }

    async fn create_admin(
        &self,
        admin: &NewAdmin,
        password_hash: &str,
    ) -> Result<Admin, AuthError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "INSERT INTO admins (id, name, email, password_hash, phone_number) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(password_hash)
        .bind(&admin.phone_number)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_insert_error(e, "Admin"))?;
        Ok(AdminWithPassword::from(row).admin)
    }

    async fn list_admins(&self) -> Result<Vec<Admin>, AuthError> {
        let rows = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| AdminWithPassword::from(r).admin)
            .collect())
    }
}
