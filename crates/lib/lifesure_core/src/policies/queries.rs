//! Policy catalog queries for the PostgreSQL store.
//!
//! Purchases live in `policy_purchases`, ordered by `seq`, and are folded back
//! into each [`Policy`]. A partial unique index on active purchases makes
//! [`PolicyStore::add_purchase`] atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{PolicyError, PolicyStore};
use crate::models::policy::{NewPolicy, Policy, PolicyPatch, Purchase, PurchaseStatus};
use crate::store::{PgStore, is_foreign_key_violation, is_unique_violation};
use crate::uuid::uuidv7;

const POLICY_COLUMNS: &str =
    "id, title, description, plan, duration, image_url, created_by, created_at";

#[derive(Debug, sqlx::FromRow)]
struct PolicyRow {
    id: Uuid,
    title: String,
    description: String,
    plan: String,
    duration: String,
    image_url: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl PolicyRow {
    fn into_policy(self, purchased_by: Vec<Purchase>) -> Policy {
        Policy {
            id: self.id,
            title: self.title,
            description: self.description,
            plan: self.plan,
            duration: self.duration,
            image_url: self.image_url,
            created_by: self.created_by,
            created_at: self.created_at,
            purchased_by,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    policy_id: Uuid,
    user_id: Uuid,
    purchase_date: DateTime<Utc>,
    status: String,
}

impl PgStore {
    /// Attach purchase records to a batch of policy rows, preserving row order.
    async fn with_purchases(&self, rows: Vec<PolicyRow>) -> Result<Vec<Policy>, PolicyError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let purchases = sqlx::query_as::<_, PurchaseRow>(
            "SELECT policy_id, user_id, purchase_date, status \
             FROM policy_purchases \
             WHERE policy_id = ANY($1) \
             ORDER BY seq ASC",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await?;

        let mut by_policy: HashMap<Uuid, Vec<Purchase>> = HashMap::new();
        for p in purchases {
            let status = p
                .status
                .parse::<PurchaseStatus>()
                .map_err(PolicyError::Internal)?;
            by_policy.entry(p.policy_id).or_default().push(Purchase {
                user_id: p.user_id,
                purchase_date: p.purchase_date,
                status,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let purchases = by_policy.remove(&row.id).unwrap_or_default();
                row.into_policy(purchases)
            })
            .collect())
    }

    async fn with_purchases_one(&self, row: Option<PolicyRow>) -> Result<Option<Policy>, PolicyError> {
        match row {
            Some(row) => Ok(self.with_purchases(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PolicyStore for PgStore {
    async fn insert_policy(&self, policy: &NewPolicy) -> Result<Policy, PolicyError> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            "INSERT INTO policies (id, title, description, plan, duration, image_url, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {POLICY_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(&policy.title)
        .bind(&policy.description)
        .bind(&policy.plan)
        .bind(&policy.duration)
        .bind(policy.image_url.as_deref())
        .bind(policy.created_by)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into_policy(Vec::new()))
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, PolicyError> {
        let rows = sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;
        self.with_purchases(rows).await
    }

    async fn get_policy(&self, id: &Uuid) -> Result<Option<Policy>, PolicyError> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        self.with_purchases_one(row).await
    }

    async fn update_policy(
        &self,
        id: &Uuid,
        patch: &PolicyPatch,
    ) -> Result<Option<Policy>, PolicyError> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            "UPDATE policies SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 plan = COALESCE($4, plan), \
                 duration = COALESCE($5, duration), \
                 image_url = COALESCE($6, image_url) \
             WHERE id = $1 \
             RETURNING {POLICY_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.plan.as_deref())
        .bind(patch.duration.as_deref())
        .bind(patch.image_url.as_deref())
        .fetch_optional(self.pool())
        .await?;
        self.with_purchases_one(row).await
    }

    async fn delete_policy(&self, id: &Uuid) -> Result<Option<Policy>, PolicyError> {
        let Some(policy) = self.get_policy(id).await? else {
            return Ok(None);
        };
        let result = sqlx::query("DELETE FROM policies WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok((result.rows_affected() > 0).then_some(policy))
    }

    async fn add_purchase(&self, policy_id: &Uuid, user_id: &Uuid) -> Result<Policy, PolicyError> {
        let inserted = sqlx::query(
            "INSERT INTO policy_purchases (policy_id, user_id, status) VALUES ($1, $2, 'Active')",
        )
        .bind(policy_id)
        .bind(user_id)
        .execute(self.pool())
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(PolicyError::AlreadyPurchased),
            Err(e) if is_foreign_key_violation(&e) => return Err(PolicyError::NotFound),
            Err(e) => return Err(PolicyError::DbError(e)),
        }

        self.get_policy(policy_id).await?.ok_or(PolicyError::NotFound)
    }

    async fn set_purchase_status(
        &self,
        policy_id: &Uuid,
        user_id: &Uuid,
        status: PurchaseStatus,
    ) -> Result<bool, PolicyError> {
        let result = sqlx::query(
            "UPDATE policy_purchases SET status = $3 \
             WHERE policy_id = $1 AND user_id = $2 AND status = 'Active'",
        )
        .bind(policy_id)
        .bind(user_id)
        .bind(status.as_str())
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_policies_purchased_by(&self, user_id: &Uuid) -> Result<Vec<Policy>, PolicyError> {
        let rows = sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies p \
             WHERE EXISTS ( \
                 SELECT 1 FROM policy_purchases pp \
                 WHERE pp.policy_id = p.id AND pp.user_id = $1 AND pp.status = 'Active' \
             ) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        self.with_purchases(rows).await
    }
}
