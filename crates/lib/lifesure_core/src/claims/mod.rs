//! Claim ledger.
//!
//! Both the administrative and the policy-holder paths file the same claim
//! entity; the only difference is who is recorded as the filer.

pub mod queries;

use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::claim::{Claim, ClaimFilter, ClaimPatch, ClaimStats, ClaimStatus, ClaimView, NewClaim};
use crate::validation::{self, Problems};

/// Claim ledger errors.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence for claims.
///
/// Listings are enriched with claimant and policy summaries and ordered
/// newest first. `apply_patch` is a single atomic update.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn insert_claim(&self, claim: &NewClaim) -> Result<Claim, ClaimError>;

    async fn list_claims(&self, filter: &ClaimFilter) -> Result<Vec<ClaimView>, ClaimError>;

    async fn get_claim(&self, id: &Uuid) -> Result<Option<ClaimView>, ClaimError>;

    /// Merge `patch` and stamp `reviewer` with the current time.
    async fn apply_patch(
        &self,
        id: &Uuid,
        patch: &ClaimPatch,
        reviewer: &Uuid,
    ) -> Result<Option<ClaimView>, ClaimError>;

    /// Remove a claim, optionally only when owned by `owner`.
    async fn delete_claim(&self, id: &Uuid, owner: Option<&Uuid>)
    -> Result<Option<Claim>, ClaimError>;

    async fn claim_stats(&self) -> Result<ClaimStats, ClaimError>;
}

/// Claim fields as submitted (multipart text fields), before validation.
#[derive(Debug, Clone, Default)]
pub struct ClaimSubmission {
    pub policy_id: Option<String>,
    pub user_id: Option<String>,
    pub claim_type: Option<String>,
    pub claim_amount: Option<String>,
    pub incident_date: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl ClaimSubmission {
    /// Validate the submission.
    ///
    /// `claimant` overrides the submitted `user_id` (policy-holder path).
    pub fn validate(
        &self,
        claimant: Option<Uuid>,
        filed_by: Uuid,
        documents: Vec<String>,
    ) -> Result<NewClaim, ClaimError> {
        let mut problems = Problems::new();
        let policy_id = problems.check(uuid_field("policyId", self.policy_id.as_deref()));
        let user_id = match claimant {
            Some(id) => Some(id),
            None => problems.check(uuid_field("userId", self.user_id.as_deref())),
        };
        let claim_type = problems.check(validation::required("claimType", self.claim_type.as_deref()));
        let claim_amount =
            problems.check(validation::amount("claimAmount", self.claim_amount.as_deref()));
        let incident_date =
            problems.check(validation::date("incidentDate", self.incident_date.as_deref()));
        let description =
            problems.check(validation::required("description", self.description.as_deref()));
        // Claimants always file as Pending; only administrators pick a status.
        let status = match (claimant, validation::optional(self.status.as_deref())) {
            (_, None) => Some(ClaimStatus::Pending),
            (None, Some(s)) => problems.check(s.parse::<ClaimStatus>()),
            (Some(_), Some(_)) => {
                problems.push("status can only be set by an administrator");
                None
            }
        };

        match (
            policy_id,
            user_id,
            claim_type,
            claim_amount,
            incident_date,
            description,
            status,
        ) {
            (
                Some(policy_id),
                Some(user_id),
                Some(claim_type),
                Some(claim_amount),
                Some(incident_date),
                Some(description),
                Some(status),
            ) => Ok(NewClaim {
                claim_number: generate_claim_number(),
                policy_id,
                user_id,
                claim_type,
                claim_amount,
                incident_date,
                description,
                documents,
                status,
                filed_by,
            }),
            _ => Err(ClaimError::Validation(
                problems
                    .finish()
                    .err()
                    .unwrap_or_else(|| "invalid claim".into()),
            )),
        }
    }
}

/// JSON body for administrative claim updates.
///
/// `claimAmount` may be sent as a number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimUpdate {
    pub claim_amount: Option<serde_json::Value>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub admin_remarks: Option<String>,
}

impl ClaimUpdate {
    /// Validate into a patch. Blank strings count as absent.
    pub fn into_patch(self) -> Result<ClaimPatch, ClaimError> {
        let mut problems = Problems::new();
        let claim_amount = match self.claim_amount {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Number(n)) => {
                problems.check(validation::amount("claimAmount", Some(&n.to_string())))
            }
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
            Some(serde_json::Value::String(s)) => {
                problems.check(validation::amount("claimAmount", Some(&s)))
            }
            Some(_) => {
                problems.push("claimAmount must be a number");
                None
            }
        };
        let status = match validation::optional(self.status.as_deref()) {
            Some(s) => problems.check(s.parse::<ClaimStatus>()),
            None => None,
        };
        problems.finish().map_err(ClaimError::Validation)?;

        Ok(ClaimPatch {
            claim_amount,
            description: validation::optional(self.description.as_deref()),
            status,
            admin_remarks: validation::optional(self.admin_remarks.as_deref()),
        })
    }

    /// Status-only update: `status` is mandatory.
    pub fn into_status_patch(self) -> Result<ClaimPatch, ClaimError> {
        if validation::optional(self.status.as_deref()).is_none() {
            return Err(ClaimError::Validation("status is required".into()));
        }
        let patch = ClaimUpdate {
            claim_amount: None,
            description: None,
            ..self
        };
        patch.into_patch()
    }
}

/// `CLM-` followed by 8 upper-case alphanumerics.
pub fn generate_claim_number() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("CLM-{suffix}")
}

fn uuid_field(field: &str, value: Option<&str>) -> Result<Uuid, String> {
    let raw = validation::required(field, value)?;
    Uuid::parse_str(&raw).map_err(|_| format!("{field} must be a valid id"))
}
