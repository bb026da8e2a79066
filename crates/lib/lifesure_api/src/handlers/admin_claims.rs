//! Administrative claim handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use lifesure_core::claims::{ClaimSubmission, ClaimUpdate};
use lifesure_core::models::claim::{ClaimFilter, ClaimView};
use lifesure_core::uploads::CLAIM_DOCUMENTS;

use super::parse_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ClaimListResponse, ClaimResponse, ClaimStatsResponse, MessageResponse};
use crate::multipart::{Form, read_form};
use crate::services::claims::{self, Filer};

/// Claim text fields from a multipart form.
pub(crate) fn submission(form: &Form) -> ClaimSubmission {
    ClaimSubmission {
        policy_id: form.text("policyId"),
        user_id: form.text("userId"),
        claim_type: form.text("claimType"),
        claim_amount: form.text("claimAmount"),
        incident_date: form.text("incidentDate"),
        description: form.text("description"),
        status: form.text("status"),
    }
}

pub(crate) fn claim_response(message: Option<&str>, claim: ClaimView) -> Json<ClaimResponse> {
    Json(ClaimResponse {
        success: true,
        message: message.map(str::to_string),
        claim,
    })
}

/// `GET /api/admin/claims?status=&policyId=&userId=`
pub async fn list_handler(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<ClaimFilter>, AppError>,
) -> AppResult<Json<ClaimListResponse>> {
    let claims = claims::list(&*state.store, &filter).await?;
    Ok(Json(ClaimListResponse {
        success: true,
        claims,
    }))
}

/// `GET /api/admin/claims/stats`
pub async fn stats_handler(State(state): State<AppState>) -> AppResult<Json<ClaimStatsResponse>> {
    let stats = claims::stats(&*state.store).await?;
    Ok(Json(ClaimStatsResponse {
        success: true,
        stats,
    }))
}

/// `GET /api/admin/claims/{id}`
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ClaimResponse>> {
    let id = parse_id(&id, "Claim")?;
    let claim = claims::get(&*state.store, &id).await?;
    Ok(claim_response(None, claim))
}

/// `POST /api/admin/claims`: multipart, files on `documents`.
pub async fn create_handler(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> AppResult<(StatusCode, Json<ClaimResponse>)> {
    let form = read_form(&mut multipart, &CLAIM_DOCUMENTS, &state.uploads).await?;
    let claim = claims::create(
        &*state.store,
        &state.uploads,
        &submission(&form),
        Filer::Admin(admin.id),
        form.files,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        claim_response(Some("Claim created successfully"), claim),
    ))
}

/// `PUT /api/admin/claims/{id}`: partial update.
pub async fn update_handler(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<ClaimUpdate>, AppError>,
) -> AppResult<Json<ClaimResponse>> {
    let id = parse_id(&id, "Claim")?;
    let claim = claims::update(&*state.store, &id, body, &admin.id).await?;
    Ok(claim_response(Some("Claim updated successfully"), claim))
}

/// `PATCH /api/admin/claims/{id}/status`
pub async fn status_handler(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<ClaimUpdate>, AppError>,
) -> AppResult<Json<ClaimResponse>> {
    let id = parse_id(&id, "Claim")?;
    let claim = claims::update_status(&*state.store, &id, body, &admin.id).await?;
    Ok(claim_response(Some("Claim status updated successfully"), claim))
}

/// `DELETE /api/admin/claims/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "Claim")?;
    claims::delete(&*state.store, &state.uploads, &id, None).await?;
    Ok(Json(MessageResponse::ok("Claim deleted successfully")))
}
