//! Claim ledger domain models.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claim review status. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    #[serde(rename = "Under Review")]
    UnderReview,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 4] = [
        ClaimStatus::Pending,
        ClaimStatus::UnderReview,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
    ];

    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::UnderReview => "Under Review",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!("Invalid status '{s}'; expected one of Pending, Under Review, Approved, Rejected")
            })
    }
}

/// Stored claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: Uuid,
    /// Human-readable reference, e.g. `CLM-7Q2ZK1PA`.
    pub claim_number: String,
    pub policy_id: Uuid,
    pub user_id: Uuid,
    pub claim_type: String,
    pub claim_amount: f64,
    pub incident_date: NaiveDate,
    pub description: String,
    pub documents: Vec<String>,
    pub status: ClaimStatus,
    pub admin_remarks: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Account that filed the claim: the claimant or an administrator.
    pub filed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Validated claim ready to persist.
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub claim_number: String,
    pub policy_id: Uuid,
    pub user_id: Uuid,
    pub claim_type: String,
    pub claim_amount: f64,
    pub incident_date: NaiveDate,
    pub description: String,
    pub documents: Vec<String>,
    pub status: ClaimStatus,
    pub filed_by: Uuid,
}

/// Partial claim update applied by an administrator.
///
/// `None` keeps the stored value. Every applied patch stamps the reviewer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimPatch {
    pub claim_amount: Option<f64>,
    pub description: Option<String>,
    pub status: Option<ClaimStatus>,
    pub admin_remarks: Option<String>,
}

/// Listing filters; all optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    pub policy_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl ClaimFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, claim: &Claim) -> bool {
        self.status.is_none_or(|s| claim.status == s)
            && self.policy_id.is_none_or(|p| claim.policy_id == p)
            && self.user_id.is_none_or(|u| claim.user_id == u)
    }
}

/// Denormalized claimant summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimantSummary {
    pub name: String,
    pub email: String,
}

/// Denormalized policy summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub title: String,
    pub plan: String,
}

/// Claim enriched with claimant and policy summaries.
///
/// Summaries are absent when the referenced record no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimView {
    #[serde(flatten)]
    pub claim: Claim,
    pub claimant: Option<ClaimantSummary>,
    pub policy: Option<PolicySummary>,
}

/// Aggregate counts and amounts over the whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStats {
    pub total_claims: i64,
    pub pending_claims: i64,
    pub under_review_claims: i64,
    pub approved_claims: i64,
    pub rejected_claims: i64,
    pub total_amount: f64,
    pub amount_by_status: BTreeMap<String, f64>,
}

impl ClaimStats {
    /// Fold per-status `(status, count, amount)` groups into totals.
    pub fn from_groups(groups: impl IntoIterator<Item = (ClaimStatus, i64, f64)>) -> Self {
        let mut stats = ClaimStats {
            amount_by_status: ClaimStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), 0.0))
                .collect(),
            ..Self::default()
        };
        for (status, count, amount) in groups {
            stats.total_claims += count;
            stats.total_amount += amount;
            *stats
                .amount_by_status
                .entry(status.as_str().to_string())
                .or_default() += amount;
            match status {
                ClaimStatus::Pending => stats.pending_claims += count,
                ClaimStatus::UnderReview => stats.under_review_claims += count,
                ClaimStatus::Approved => stats.approved_claims += count,
                ClaimStatus::Rejected => stats.rejected_claims += count,
            }
        }
        stats
    }
}
