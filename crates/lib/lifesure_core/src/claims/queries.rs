//! Claim ledger queries for the PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{ClaimError, ClaimStore};
use crate::models::claim::{
    Claim, ClaimFilter, ClaimPatch, ClaimStats, ClaimStatus, ClaimView, ClaimantSummary,
    NewClaim, PolicySummary,
};
use crate::store::PgStore;
use crate::uuid::uuidv7;

const CLAIM_COLUMNS: &str = "id, claim_number, policy_id, user_id, claim_type, claim_amount, \
     incident_date, description, documents, status, admin_remarks, reviewed_by, reviewed_at, \
     filed_by, created_at";

const VIEW_SELECT: &str = "SELECT c.id, c.claim_number, c.policy_id, c.user_id, c.claim_type, \
     c.claim_amount, c.incident_date, c.description, c.documents, c.status, c.admin_remarks, \
     c.reviewed_by, c.reviewed_at, c.filed_by, c.created_at, \
     u.name AS claimant_name, u.email AS claimant_email, \
     p.title AS policy_title, p.plan AS policy_plan \
     FROM claims c \
     LEFT JOIN users u ON u.id = c.user_id \
     LEFT JOIN policies p ON p.id = c.policy_id";

#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    id: Uuid,
    claim_number: String,
    policy_id: Uuid,
    user_id: Uuid,
    claim_type: String,
    claim_amount: f64,
    incident_date: NaiveDate,
    description: String,
    documents: Vec<String>,
    status: String,
    admin_remarks: Option<String>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    filed_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for Claim {
    type Error = ClaimError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        Ok(Claim {
            id: row.id,
            claim_number: row.claim_number,
            policy_id: row.policy_id,
            user_id: row.user_id,
            claim_type: row.claim_type,
            claim_amount: row.claim_amount,
            incident_date: row.incident_date,
            description: row.description,
            documents: row.documents,
            status: row.status.parse().map_err(ClaimError::Internal)?,
            admin_remarks: row.admin_remarks,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            filed_by: row.filed_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClaimViewRow {
    #[sqlx(flatten)]
    claim: ClaimRow,
    claimant_name: Option<String>,
    claimant_email: Option<String>,
    policy_title: Option<String>,
    policy_plan: Option<String>,
}

impl TryFrom<ClaimViewRow> for ClaimView {
    type Error = ClaimError;

    fn try_from(row: ClaimViewRow) -> Result<Self, Self::Error> {
        let claimant = match (row.claimant_name, row.claimant_email) {
            (Some(name), Some(email)) => Some(ClaimantSummary { name, email }),
            _ => None,
        };
        let policy = match (row.policy_title, row.policy_plan) {
            (Some(title), Some(plan)) => Some(PolicySummary { title, plan }),
            _ => None,
        };
        Ok(ClaimView {
            claim: Claim::try_from(row.claim)?,
            claimant,
            policy,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusGroupRow {
    status: String,
    count: i64,
    amount: f64,
}

#[async_trait]
impl ClaimStore for PgStore {
    async fn insert_claim(&self, claim: &NewClaim) -> Result<Claim, ClaimError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "INSERT INTO claims (id, claim_number, policy_id, user_id, claim_type, claim_amount, \
                 incident_date, description, documents, status, filed_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {CLAIM_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(&claim.claim_number)
        .bind(claim.policy_id)
        .bind(claim.user_id)
        .bind(&claim.claim_type)
        .bind(claim.claim_amount)
        .bind(claim.incident_date)
        .bind(&claim.description)
        .bind(&claim.documents)
        .bind(claim.status.as_str())
        .bind(claim.filed_by)
        .fetch_one(self.pool())
        .await?;
        Claim::try_from(row)
    }

    async fn list_claims(&self, filter: &ClaimFilter) -> Result<Vec<ClaimView>, ClaimError> {
        let rows = sqlx::query_as::<_, ClaimViewRow>(&format!(
            "{VIEW_SELECT} \
             WHERE ($1::text IS NULL OR c.status = $1) \
               AND ($2::uuid IS NULL OR c.policy_id = $2) \
               AND ($3::uuid IS NULL OR c.user_id = $3) \
             ORDER BY c.created_at DESC, c.id DESC"
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.policy_id)
        .bind(filter.user_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(ClaimView::try_from).collect()
    }

    async fn get_claim(&self, id: &Uuid) -> Result<Option<ClaimView>, ClaimError> {
        let row = sqlx::query_as::<_, ClaimViewRow>(&format!("{VIEW_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(ClaimView::try_from).transpose()
    }

    async fn apply_patch(
        &self,
        id: &Uuid,
        patch: &ClaimPatch,
        reviewer: &Uuid,
    ) -> Result<Option<ClaimView>, ClaimError> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            "UPDATE claims SET \
                 claim_amount = COALESCE($2, claim_amount), \
                 description = COALESCE($3, description), \
                 status = COALESCE($4, status), \
                 admin_remarks = COALESCE($5, admin_remarks), \
                 reviewed_by = $6, \
                 reviewed_at = now() \
             WHERE id = $1 \
             RETURNING id",
        )
        .bind(id)
        .bind(patch.claim_amount)
        .bind(patch.description.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.admin_remarks.as_deref())
        .bind(reviewer)
        .fetch_optional(self.pool())
        .await?;

        match updated {
            Some(id) => self.get_claim(&id).await,
            None => Ok(None),
        }
    }

    async fn delete_claim(
        &self,
        id: &Uuid,
        owner: Option<&Uuid>,
    ) -> Result<Option<Claim>, ClaimError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "DELETE FROM claims WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2) \
             RETURNING {CLAIM_COLUMNS}"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool())
        .await?;
        row.map(Claim::try_from).transpose()
    }

    async fn claim_stats(&self) -> Result<ClaimStats, ClaimError> {
        let rows = sqlx::query_as::<_, StatusGroupRow>(
            "SELECT status, COUNT(*)::bigint AS count, \
                    COALESCE(SUM(claim_amount), 0)::float8 AS amount \
             FROM claims GROUP BY status",
        )
        .fetch_all(self.pool())
        .await?;

        let groups = rows
            .into_iter()
            .map(|r| {
                r.status
                    .parse::<ClaimStatus>()
                    .map(|status| (status, r.count, r.amount))
                    .map_err(ClaimError::Internal)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ClaimStats::from_groups(groups))
    }
}
