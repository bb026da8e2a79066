//! Policy catalog: listings and their embedded purchase records.

pub mod queries;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::policy::{NewPolicy, Policy, PolicyListing, PolicyPatch, PurchaseStatus};
use crate::validation::{self, Problems};

/// Policy catalog errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("You already have an active purchase of this policy")]
    AlreadyPurchased,

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence for policy listings.
///
/// Listing order is newest first. `add_purchase` is atomic with respect to
/// the one-active-purchase-per-user invariant: of two concurrent purchases
/// by the same user exactly one succeeds.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn insert_policy(&self, policy: &NewPolicy) -> Result<Policy, PolicyError>;

    async fn list_policies(&self) -> Result<Vec<Policy>, PolicyError>;

    async fn get_policy(&self, id: &Uuid) -> Result<Option<Policy>, PolicyError>;

    /// Apply `patch`, returning the updated policy or `None` if absent.
    async fn update_policy(
        &self,
        id: &Uuid,
        patch: &PolicyPatch,
    ) -> Result<Option<Policy>, PolicyError>;

    /// Remove a policy, returning what was removed.
    async fn delete_policy(&self, id: &Uuid) -> Result<Option<Policy>, PolicyError>;

    /// Append an `Active` purchase for `user_id`.
    ///
    /// Fails with [`PolicyError::NotFound`] or
    /// [`PolicyError::AlreadyPurchased`].
    async fn add_purchase(&self, policy_id: &Uuid, user_id: &Uuid) -> Result<Policy, PolicyError>;

    /// Move the user's active purchase to `status`. Returns whether one existed.
    async fn set_purchase_status(
        &self,
        policy_id: &Uuid,
        user_id: &Uuid,
        status: PurchaseStatus,
    ) -> Result<bool, PolicyError>;

    /// Policies on which `user_id` holds an active purchase, newest first.
    async fn list_policies_purchased_by(&self, user_id: &Uuid) -> Result<Vec<Policy>, PolicyError>;
}

/// Text fields of a policy as submitted, before validation.
#[derive(Debug, Clone, Default)]
pub struct PolicyDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub plan: Option<String>,
    pub duration: Option<String>,
}

impl PolicyDraft {
    /// Validate a complete draft for creation.
    pub fn into_new_policy(
        self,
        created_by: Uuid,
        image_url: Option<String>,
    ) -> Result<NewPolicy, PolicyError> {
        let mut problems = Problems::new();
        let title = problems.check(validation::required("title", self.title.as_deref()));
        let description =
            problems.check(validation::required("description", self.description.as_deref()));
        let plan = problems.check(validation::required("plan", self.plan.as_deref()));
        let duration = problems.check(validation::required("duration", self.duration.as_deref()));

        match (title, description, plan, duration) {
            (Some(title), Some(description), Some(plan), Some(duration)) => Ok(NewPolicy {
                title,
                description,
                plan,
                duration,
                image_url,
                created_by,
            }),
            _ => Err(PolicyError::Validation(
                problems
                    .finish()
                    .err()
                    .unwrap_or_else(|| "invalid policy".into()),
            )),
        }
    }

    /// Merge semantics for edits: blank or absent fields keep stored values.
    pub fn into_patch(self, image_url: Option<String>) -> PolicyPatch {
        PolicyPatch {
            title: validation::optional(self.title.as_deref()),
            description: validation::optional(self.description.as_deref()),
            plan: validation::optional(self.plan.as_deref()),
            duration: validation::optional(self.duration.as_deref()),
            image_url,
        }
    }
}

/// Annotate listings for a caller: active purchase and any filed claim.
pub fn personalise(
    policies: Vec<Policy>,
    user_id: &Uuid,
    claimed_policy_ids: &HashSet<Uuid>,
) -> Vec<PolicyListing> {
    policies
        .into_iter()
        .map(|policy| {
            let is_purchased = policy.is_active_for(user_id);
            let has_claim = claimed_policy_ids.contains(&policy.id);
            PolicyListing {
                policy,
                is_purchased: Some(is_purchased),
                has_claim: Some(has_claim),
            }
        })
        .collect()
}
