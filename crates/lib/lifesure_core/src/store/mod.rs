//! Storage backends.
//!
//! Each aggregate declares its own store trait next to its domain logic
//! ([`CredentialStore`], [`PolicyStore`], [`ClaimStore`]); a backend implements
//! all three and is used through [`Store`]. [`PgStore`] persists to
//! PostgreSQL, [`MemoryStore`] keeps everything in process.

pub mod memory;

use sqlx::PgPool;

use crate::auth::CredentialStore;
use crate::claims::ClaimStore;
use crate::policies::PolicyStore;

pub use memory::MemoryStore;

/// A complete storage backend.
pub trait Store: CredentialStore + PolicyStore + ClaimStore {}

impl<T> Store for T where T: CredentialStore + PolicyStore + ClaimStore {}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Whether `e` is a unique-constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Whether `e` is a foreign-key violation.
pub(crate) fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}
