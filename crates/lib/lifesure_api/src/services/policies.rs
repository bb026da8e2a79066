//! Policy catalog service.
//!
//! Image replacement is ordered: the new file is written, the record is
//! committed (the new file is removed again if that fails) and only then is
//! the old file deleted.

use std::collections::HashSet;

use lifesure_core::models::claim::ClaimFilter;
use lifesure_core::models::policy::{Policy, PolicyListing};
use lifesure_core::policies::{PolicyDraft, PolicyError, personalise};
use lifesure_core::store::Store;
use lifesure_core::uploads::{POLICY_IMAGE, UploadStorage};
use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;
use crate::multipart::{PendingFile, save_files};

async fn save_image(uploads: &UploadStorage, image: Option<PendingFile>) -> AppResult<Option<String>> {
    match image {
        Some(file) => Ok(save_files(uploads, &POLICY_IMAGE, vec![file]).await?.pop()),
        None => Ok(None),
    }
}

/// All policies, newest first, personalised when `viewer` is known.
pub async fn list(store: &dyn Store, viewer: Option<&Uuid>) -> AppResult<Vec<PolicyListing>> {
    let policies = store.list_policies().await?;
    let Some(user_id) = viewer else {
        return Ok(policies.into_iter().map(PolicyListing::anonymous).collect());
    };
    let claimed: HashSet<Uuid> = store
        .list_claims(&ClaimFilter::for_user(*user_id))
        .await?
        .into_iter()
        .map(|view| view.claim.policy_id)
        .collect();
    Ok(personalise(policies, user_id, &claimed))
}

pub async fn get(store: &dyn Store, id: &Uuid) -> AppResult<Policy> {
    Ok(store.get_policy(id).await?.ok_or(PolicyError::NotFound)?)
}

/// Create a listing. Fields are validated before the image is written.
pub async fn create(
    store: &dyn Store,
    uploads: &UploadStorage,
    draft: PolicyDraft,
    image: Option<PendingFile>,
    created_by: Uuid,
) -> AppResult<Policy> {
    let mut new_policy = draft.into_new_policy(created_by, None)?;
    new_policy.image_url = save_image(uploads, image).await?;

    match store.insert_policy(&new_policy).await {
        Ok(policy) => {
            info!(id = %policy.id, title = %policy.title, "policy created");
            Ok(policy)
        }
        Err(e) => {
            if let Some(url) = &new_policy.image_url {
                uploads.remove(url).await;
            }
            Err(e.into())
        }
    }
}

/// Merge non-blank fields and optionally replace the image.
pub async fn update(
    store: &dyn Store,
    uploads: &UploadStorage,
    id: &Uuid,
    draft: PolicyDraft,
    image: Option<PendingFile>,
) -> AppResult<Policy> {
    let existing = get(store, id).await?;
    let new_image = save_image(uploads, image).await?;
    let patch = draft.into_patch(new_image.clone());

    let updated = match store
        .update_policy(id, &patch)
        .await
        .and_then(|p| p.ok_or(PolicyError::NotFound))
    {
        Ok(policy) => policy,
        Err(e) => {
            if let Some(url) = &new_image {
                uploads.remove(url).await;
            }
            return Err(e.into());
        }
    };

    if new_image.is_some()
        && let Some(old) = existing.image_url
        && updated.image_url.as_deref() != Some(old.as_str())
    {
        uploads.remove(&old).await;
    }
    info!(id = %updated.id, "policy updated");
    Ok(updated)
}

/// Delete a listing, then its image best-effort.
pub async fn delete(store: &dyn Store, uploads: &UploadStorage, id: &Uuid) -> AppResult<()> {
    let removed = store.delete_policy(id).await?.ok_or(PolicyError::NotFound)?;
    if let Some(url) = &removed.image_url {
        uploads.remove(url).await;
    }
    info!(id = %removed.id, "policy deleted");
    Ok(())
}

pub async fn purchase(store: &dyn Store, id: &Uuid, user_id: &Uuid) -> AppResult<Policy> {
    let policy = store.add_purchase(id, user_id).await?;
    info!(policy = %policy.id, user = %user_id, "policy purchased");
    Ok(policy)
}

/// Policies the caller holds an active purchase on.
pub async fn mine(store: &dyn Store, user_id: &Uuid) -> AppResult<Vec<Policy>> {
    Ok(store.list_policies_purchased_by(user_id).await?)
}
