//! Claim ledger service, shared by the administrative and policy-holder
//! routes.

use lifesure_core::auth::AuthError;
use lifesure_core::claims::{ClaimError, ClaimSubmission, ClaimUpdate};
use lifesure_core::models::claim::{Claim, ClaimFilter, ClaimStats, ClaimView};
use lifesure_core::policies::PolicyError;
use lifesure_core::store::Store;
use lifesure_core::uploads::{CLAIM_DOCUMENTS, UploadStorage};
use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;
use crate::multipart::{PendingFile, save_files};

/// Who is filing a claim.
#[derive(Debug, Clone, Copy)]
pub enum Filer {
    /// A policy holder filing for themselves.
    Claimant(Uuid),
    /// An administrator filing on behalf of the submitted `userId`.
    Admin(Uuid),
}

async fn view_of(store: &dyn Store, claim: Claim) -> AppResult<ClaimView> {
    Ok(store.get_claim(&claim.id).await?.unwrap_or(ClaimView {
        claim,
        claimant: None,
        policy: None,
    }))
}

/// File a claim. Fields and references are checked before any document is
/// written; documents are removed again if the insert fails.
pub async fn create(
    store: &dyn Store,
    uploads: &UploadStorage,
    submission: &ClaimSubmission,
    filer: Filer,
    documents: Vec<PendingFile>,
) -> AppResult<ClaimView> {
    let (claimant, filed_by) = match filer {
        Filer::Claimant(id) => (Some(id), id),
        Filer::Admin(id) => (None, id),
    };
    let mut new_claim = submission.validate(claimant, filed_by, Vec::new())?;

    if store.get_policy(&new_claim.policy_id).await?.is_none() {
        return Err(PolicyError::NotFound.into());
    }
    if store.get_user_by_id(&new_claim.user_id).await?.is_none() {
        return Err(AuthError::NotFound("User not found".into()).into());
    }

    new_claim.documents = save_files(uploads, &CLAIM_DOCUMENTS, documents).await?;
    let claim = match store.insert_claim(&new_claim).await {
        Ok(claim) => claim,
        Err(e) => {
            uploads.remove_all(&new_claim.documents).await;
            return Err(e.into());
        }
    };
    info!(
        id = %claim.id,
        number = %claim.claim_number,
        user = %claim.user_id,
        filed_by = %claim.filed_by,
        "claim filed"
    );
    view_of(store, claim).await
}

pub async fn list(store: &dyn Store, filter: &ClaimFilter) -> AppResult<Vec<ClaimView>> {
    Ok(store.list_claims(filter).await?)
}

pub async fn get(store: &dyn Store, id: &Uuid) -> AppResult<ClaimView> {
    Ok(store.get_claim(id).await?.ok_or(ClaimError::NotFound)?)
}

/// Partial update; absent fields keep their values.
pub async fn update(
    store: &dyn Store,
    id: &Uuid,
    body: ClaimUpdate,
    reviewer: &Uuid,
) -> AppResult<ClaimView> {
    let patch = body.into_patch()?;
    let view = store
        .apply_patch(id, &patch, reviewer)
        .await?
        .ok_or(ClaimError::NotFound)?;
    info!(id = %id, status = %view.claim.status, reviewer = %reviewer, "claim updated");
    Ok(view)
}

/// Status change with optional remarks.
pub async fn update_status(
    store: &dyn Store,
    id: &Uuid,
    body: ClaimUpdate,
    reviewer: &Uuid,
) -> AppResult<ClaimView> {
    let patch = body.into_status_patch()?;
    let view = store
        .apply_patch(id, &patch, reviewer)
        .await?
        .ok_or(ClaimError::NotFound)?;
    info!(id = %id, status = %view.claim.status, reviewer = %reviewer, "claim status changed");
    Ok(view)
}

/// Delete a claim, optionally only the caller's own, then its documents.
pub async fn delete(
    store: &dyn Store,
    uploads: &UploadStorage,
    id: &Uuid,
    owner: Option<&Uuid>,
) -> AppResult<()> {
    let removed = store
        .delete_claim(id, owner)
        .await?
        .ok_or(ClaimError::NotFound)?;
    uploads.remove_all(&removed.documents).await;
    info!(id = %removed.id, "claim deleted");
    Ok(())
}

pub async fn stats(store: &dyn Store) -> AppResult<ClaimStats> {
    Ok(store.claim_stats().await?)
}
