//! Policy-holder claim handlers. Every operation is scoped to the caller.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use lifesure_core::models::claim::ClaimFilter;
use lifesure_core::uploads::CLAIM_DOCUMENTS;

use super::admin_claims::{claim_response, submission};
use super::parse_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ClaimListResponse, ClaimResponse, MessageResponse};
use crate::multipart::read_form;
use crate::services::claims::{self, Filer};

/// `POST /api/claims/create`: file a claim as the caller.
pub async fn create_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> AppResult<(StatusCode, Json<ClaimResponse>)> {
    let form = read_form(&mut multipart, &CLAIM_DOCUMENTS, &state.uploads).await?;
    let claim = claims::create(
        &*state.store,
        &state.uploads,
        &submission(&form),
        Filer::Claimant(user.id),
        form.files,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        claim_response(Some("Claim created successfully"), claim),
    ))
}

/// `GET /api/claims`: the caller's claims, newest first.
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<ClaimListResponse>> {
    let claims = claims::list(&*state.store, &ClaimFilter::for_user(user.id)).await?;
    Ok(Json(ClaimListResponse {
        success: true,
        claims,
    }))
}

/// `DELETE /api/claims/{id}`: only the caller's own claim.
pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "Claim")?;
    claims::delete(&*state.store, &state.uploads, &id, Some(&user.id)).await?;
    Ok(Json(MessageResponse::ok("Claim deleted successfully")))
}
