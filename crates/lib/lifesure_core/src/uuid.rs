//! UUIDv7 ids.
//!
//! Every row id is generated app-side as a UUIDv7 so that ids sort in
//! creation order and can break `created_at` ties in listings.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
