//! Policy catalog domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a single purchase record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseStatus {
    Active,
    Expired,
    Cancelled,
}

impl PurchaseStatus {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Active => "Active",
            PurchaseStatus::Expired => "Expired",
            PurchaseStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::str::FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(PurchaseStatus::Active),
            "Expired" => Ok(PurchaseStatus::Expired),
            "Cancelled" => Ok(PurchaseStatus::Cancelled),
            other => Err(format!("Unknown purchase status '{other}'")),
        }
    }
}

/// A user's purchase of a policy, embedded in the policy in purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub user_id: Uuid,
    pub purchase_date: DateTime<Utc>,
    pub status: PurchaseStatus,
}

/// Catalog entry with its purchase history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub plan: String,
    pub duration: String,
    pub image_url: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub purchased_by: Vec<Purchase>,
}

impl Policy {
    /// Whether `user_id` currently holds an active purchase.
    pub fn is_active_for(&self, user_id: &Uuid) -> bool {
        self.purchased_by
            .iter()
            .any(|p| p.user_id == *user_id && p.status == PurchaseStatus::Active)
    }
}

/// Validated policy creation.
#[derive(Debug, Clone)]
pub struct NewPolicy {
    pub title: String,
    pub description: String,
    pub plan: String,
    pub duration: String,
    pub image_url: Option<String>,
    pub created_by: Uuid,
}

/// Partial policy edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub plan: Option<String>,
    pub duration: Option<String>,
    pub image_url: Option<String>,
}

/// Policy as presented to a caller, optionally personalised.
///
/// Anonymous listings leave both flags unset so they are omitted from JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListing {
    #[serde(flatten)]
    pub policy: Policy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_purchased: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_claim: Option<bool>,
}

impl PolicyListing {
    pub fn anonymous(policy: Policy) -> Self {
        Self {
            policy,
            is_purchased: None,
            has_claim: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_with(purchases: Vec<Purchase>) -> Policy {
        Policy {
            id: Uuid::now_v7(),
            title: "Term Life".into(),
            description: "Cover".into(),
            plan: "Gold".into(),
            duration: "10 years".into(),
            image_url: None,
            created_by: Uuid::now_v7(),
            created_at: Utc::now(),
            purchased_by: purchases,
        }
    }

    #[test]
    fn only_active_purchases_count() {
        let user = Uuid::now_v7();
        let expired = policy_with(vec![Purchase {
            user_id: user,
            purchase_date: Utc::now(),
            status: PurchaseStatus::Expired,
        }]);
        assert!(!expired.is_active_for(&user));

        let active = policy_with(vec![Purchase {
            user_id: user,
            purchase_date: Utc::now(),
            status: PurchaseStatus::Active,
        }]);
        assert!(active.is_active_for(&user));
        assert!(!active.is_active_for(&Uuid::now_v7()));
    }

    #[test]
    fn anonymous_listing_omits_flags() {
        let json = serde_json::to_value(PolicyListing::anonymous(policy_with(vec![]))).unwrap();
        assert!(json.get("isPurchased").is_none());
        assert!(json.get("hasClaim").is_none());
        assert_eq!(json["title"], "Term Life");
        assert!(json["purchasedBy"].as_array().unwrap().is_empty());
    }
}
