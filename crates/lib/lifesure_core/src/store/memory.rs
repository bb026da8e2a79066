//! In-process store.
//!
//! All tables sit behind one `RwLock`, so every trait method is atomic with
//! respect to the others. Data is lost when the process exits.

use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{AuthError, CredentialStore};
use crate::claims::{ClaimError, ClaimStore};
use crate::models::auth::{Admin, AdminWithPassword, NewAdmin, NewUser, User, UserWithPassword};
use crate::models::claim::{
    Claim, ClaimFilter, ClaimPatch, ClaimStats, ClaimView, ClaimantSummary, NewClaim,
    PolicySummary,
};
use crate::models::policy::{NewPolicy, Policy, PolicyPatch, Purchase, PurchaseStatus};
use crate::policies::{PolicyError, PolicyStore};
use crate::uuid::uuidv7;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserWithPassword>,
    admins: Vec<AdminWithPassword>,
    policies: Vec<Policy>,
    claims: Vec<Claim>,
}

impl Tables {
    fn view(&self, claim: &Claim) -> ClaimView {
        let claimant = self
            .users
            .iter()
            .find(|u| u.user.id == claim.user_id)
            .map(|u| ClaimantSummary {
                name: u.user.name.clone(),
                email: u.user.email.clone(),
            });
        let policy = self
            .policies
            .iter()
            .find(|p| p.id == claim.policy_id)
            .map(|p| PolicySummary {
                title: p.title.clone(),
                plan: p.plan.clone(),
            });
        ClaimView {
            claim: claim.clone(),
            claimant,
            policy,
        }
    }
}

/// Store that keeps every table in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first; UUIDv7 ids break timestamp ties in creation order.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid)) {
    items.sort_by_key(|item| Reverse(key(item)));
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.user.email == email).cloned())
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AuthError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.user.id == *id)
            .map(|u| u.user.clone()))
    }

    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<User, AuthError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.user.email == user.email) {
            return Err(AuthError::Conflict(
                "User already exists with this email".into(),
            ));
        }
        let created = User {
            id: uuidv7(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            gender: user.gender,
            dob: user.dob,
            city: user.city.clone(),
            state: user.state.clone(),
            pin_code: user.pin_code.clone(),
            created_at: Utc::now(),
        };
        tables.users.push(UserWithPassword {
            user: created.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(created)
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.iter().map(|u| u.user.clone()).collect();
        newest_first(&mut users, |u| (u.created_at, u.id));
        Ok(users)
    }

    async fn find_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AdminWithPassword>, AuthError> {
        let tables = self.tables.read().await;
        Ok(tables.admins.iter().find(|a| a.admin.email == email).cloned())
    }

    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<Admin>, AuthError> {
        let tables = self.tables.read().await;
        Ok(tables
            .admins
            .iter()
            .find(|a| a.admin.id == *id)
            .map(|a| a.admin.clone()))
    }

    async fn create_admin(
        &self,
        admin: &NewAdmin,
        password_hash: &str,
    ) -> Result<Admin, AuthError> {
        let mut tables = self.tables.write().await;
        if tables.admins.iter().any(|a| a.admin.email == admin.email) {
            return Err(AuthError::Conflict(
                "Admin already exists with this email".into(),
            ));
        }
        let created = Admin {
            id: uuidv7(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            phone_number: admin.phone_number.clone(),
            created_at: Utc::now(),
        };
        tables.admins.push(AdminWithPassword {
            admin: created.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(created)
    }

    async fn list_admins(&self) -> Result<Vec<Admin>, AuthError> {
        let tables = self.tables.read().await;
        let mut admins: Vec<Admin> = tables.admins.iter().map(|a| a.admin.clone()).collect();
        newest_first(&mut admins, |a| (a.created_at, a.id));
        Ok(admins)
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn insert_policy(&self, policy: &NewPolicy) -> Result<Policy, PolicyError> {
        let created = Policy {
            id: uuidv7(),
            title: policy.title.clone(),
            description: policy.description.clone(),
            plan: policy.plan.clone(),
            duration: policy.duration.clone(),
            image_url: policy.image_url.clone(),
            created_by: policy.created_by,
            created_at: Utc::now(),
            purchased_by: Vec::new(),
        };
        self.tables.write().await.policies.push(created.clone());
        Ok(created)
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, PolicyError> {
        let mut policies = self.tables.read().await.policies.clone();
        newest_first(&mut policies, |p| (p.created_at, p.id));
        Ok(policies)
    }

    async fn get_policy(&self, id: &Uuid) -> Result<Option<Policy>, PolicyError> {
        let tables = self.tables.read().await;
        Ok(tables.policies.iter().find(|p| p.id == *id).cloned())
    }

    async fn update_policy(
        &self,
        id: &Uuid,
        patch: &PolicyPatch,
    ) -> Result<Option<Policy>, PolicyError> {
        let mut tables = self.tables.write().await;
        let Some(policy) = tables.policies.iter_mut().find(|p| p.id == *id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            policy.title = title.clone();
        }
        if let Some(description) = &patch.description {
            policy.description = description.clone();
        }
        if let Some(plan) = &patch.plan {
            policy.plan = plan.clone();
        }
        if let Some(duration) = &patch.duration {
            policy.duration = duration.clone();
        }
        if let Some(image_url) = &patch.image_url {
            policy.image_url = Some(image_url.clone());
        }
        Ok(Some(policy.clone()))
    }

    async fn delete_policy(&self, id: &Uuid) -> Result<Option<Policy>, PolicyError> {
        let mut tables = self.tables.write().await;
        let index = tables.policies.iter().position(|p| p.id == *id);
        Ok(index.map(|i| tables.policies.remove(i)))
    }

    async fn add_purchase(&self, policy_id: &Uuid, user_id: &Uuid) -> Result<Policy, PolicyError> {
        let mut tables = self.tables.write().await;
        let policy = tables
            .policies
            .iter_mut()
            .find(|p| p.id == *policy_id)
            .ok_or(PolicyError::NotFound)?;
        if policy.is_active_for(user_id) {
            return Err(PolicyError::AlreadyPurchased);
        }
        policy.purchased_by.push(Purchase {
            user_id: *user_id,
            purchase_date: Utc::now(),
            status: PurchaseStatus::Active,
        });
        Ok(policy.clone())
    }

    async fn set_purchase_status(
        &self,
        policy_id: &Uuid,
        user_id: &Uuid,
        status: PurchaseStatus,
    ) -> Result<bool, PolicyError> {
        let mut tables = self.tables.write().await;
        let Some(policy) = tables.policies.iter_mut().find(|p| p.id == *policy_id) else {
            return Ok(false);
        };
        let mut changed = false;
        for purchase in policy
            .purchased_by
            .iter_mut()
            .filter(|p| p.user_id == *user_id && p.status == PurchaseStatus::Active)
        {
            purchase.status = status;
            changed = true;
        }
        Ok(changed)
    }

    async fn list_policies_purchased_by(&self, user_id: &Uuid) -> Result<Vec<Policy>, PolicyError> {
        let tables = self.tables.read().await;
        let mut policies: Vec<Policy> = tables
            .policies
            .iter()
            .filter(|p| p.is_active_for(user_id))
            .cloned()
            .collect();
        newest_first(&mut policies, |p| (p.created_at, p.id));
        Ok(policies)
    }
}

#[async_trait]
impl ClaimStore for MemoryStore {
    async fn insert_claim(&self, claim: &NewClaim) -> Result<Claim, ClaimError> {
        let created = Claim {
            id: uuidv7(),
            claim_number: claim.claim_number.clone(),
            policy_id: claim.policy_id,
            user_id: claim.user_id,
            claim_type: claim.claim_type.clone(),
            claim_amount: claim.claim_amount,
            incident_date: claim.incident_date,
            description: claim.description.clone(),
            documents: claim.documents.clone(),
            status: claim.status,
            admin_remarks: None,
            reviewed_by: None,
            reviewed_at: None,
            filed_by: claim.filed_by,
            created_at: Utc::now(),
        };
        self.tables.write().await.claims.push(created.clone());
        Ok(created)
    }

    async fn list_claims(&self, filter: &ClaimFilter) -> Result<Vec<ClaimView>, ClaimError> {
        let tables = self.tables.read().await;
        let mut views: Vec<ClaimView> = tables
            .claims
            .iter()
            .filter(|c| filter.matches(c))
            .map(|c| tables.view(c))
            .collect();
        newest_first(&mut views, |v| (v.claim.created_at, v.claim.id));
        Ok(views)
    }

    async fn get_claim(&self, id: &Uuid) -> Result<Option<ClaimView>, ClaimError> {
        let tables = self.tables.read().await;
        Ok(tables
            .claims
            .iter()
            .find(|c| c.id == *id)
            .map(|c| tables.view(c)))
    }

    async fn apply_patch(
        &self,
        id: &Uuid,
        patch: &ClaimPatch,
        reviewer: &Uuid,
    ) -> Result<Option<ClaimView>, ClaimError> {
        let mut tables = self.tables.write().await;
        let Some(claim) = tables.claims.iter_mut().find(|c| c.id == *id) else {
            return Ok(None);
        };
        if let Some(amount) = patch.claim_amount {
            claim.claim_amount = amount;
        }
        if let Some(description) = &patch.description {
            claim.description = description.clone();
        }
        if let Some(status) = patch.status {
            claim.status = status;
        }
        if let Some(remarks) = &patch.admin_remarks {
            claim.admin_remarks = Some(remarks.clone());
        }
        claim.reviewed_by = Some(*reviewer);
        claim.reviewed_at = Some(Utc::now());
        let updated = claim.clone();
        Ok(Some(tables.view(&updated)))
    }

    async fn delete_claim(
        &self,
        id: &Uuid,
        owner: Option<&Uuid>,
    ) -> Result<Option<Claim>, ClaimError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .claims
            .iter()
            .position(|c| c.id == *id && owner.is_none_or(|o| c.user_id == *o));
        Ok(index.map(|i| tables.claims.remove(i)))
    }

    async fn claim_stats(&self) -> Result<ClaimStats, ClaimError> {
        let tables = self.tables.read().await;
        Ok(ClaimStats::from_groups(
            tables.claims.iter().map(|c| (c.status, 1, c.claim_amount)),
        ))
    }
}
