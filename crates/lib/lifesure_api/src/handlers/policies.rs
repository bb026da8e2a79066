//! Policy catalog handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use lifesure_core::models::policy::{Policy, PolicyListing};
use lifesure_core::policies::PolicyDraft;
use lifesure_core::uploads::POLICY_IMAGE;

use super::parse_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthenticatedUser, OptionalUser};
use crate::models::{MessageResponse, PolicyListResponse, PolicyResponse};
use crate::multipart::{Form, read_form};
use crate::services::policies;

fn draft(form: &Form) -> PolicyDraft {
    PolicyDraft {
        title: form.text("title"),
        description: form.text("description"),
        plan: form.text("plan"),
        duration: form.text("duration"),
    }
}

fn policy_response(message: Option<&str>, policy: Policy) -> Json<PolicyResponse> {
    Json(PolicyResponse {
        success: true,
        message: message.map(str::to_string),
        policy,
    })
}

/// `GET /api/policy`: newest first; personalised for a known caller.
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(OptionalUser(viewer)): Extension<OptionalUser>,
) -> AppResult<Json<PolicyListResponse>> {
    let policies = policies::list(&*state.store, viewer.as_ref().map(|u| &u.id)).await?;
    Ok(Json(PolicyListResponse {
        success: true,
        policies,
    }))
}

/// `GET /api/policy/{id}`
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PolicyResponse>> {
    let id = parse_id(&id, "Policy")?;
    let policy = policies::get(&*state.store, &id).await?;
    Ok(policy_response(None, policy))
}

/// `GET /api/policy/my-policies`
pub async fn mine_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<PolicyListResponse>> {
    let policies = policies::mine(&*state.store, &user.id)
        .await?
        .into_iter()
        .map(PolicyListing::anonymous)
        .collect();
    Ok(Json(PolicyListResponse {
        success: true,
        policies,
    }))
}

/// `POST /api/policy/{id}/purchase`
pub async fn purchase_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<PolicyResponse>> {
    let id = parse_id(&id, "Policy")?;
    let policy = policies::purchase(&*state.store, &id, &user.id).await?;
    Ok(policy_response(Some("Policy purchased successfully"), policy))
}

/// `POST /api/policy`: multipart with an optional `image` file.
pub async fn create_handler(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> AppResult<(StatusCode, Json<PolicyResponse>)> {
    let mut form = read_form(&mut multipart, &POLICY_IMAGE, &state.uploads).await?;
    let image = form.files.pop();
    let policy = policies::create(&*state.store, &state.uploads, draft(&form), image, admin.id).await?;
    Ok((
        StatusCode::CREATED,
        policy_response(Some("Policy created successfully"), policy),
    ))
}

/// `PUT /api/policy/{id}`: multipart; blank fields keep stored values.
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> AppResult<Json<PolicyResponse>> {
    let id = parse_id(&id, "Policy")?;
    let mut form = read_form(&mut multipart, &POLICY_IMAGE, &state.uploads).await?;
    let image = form.files.pop();
    let policy = policies::update(&*state.store, &state.uploads, &id, draft(&form), image).await?;
    Ok(policy_response(Some("Policy updated successfully"), policy))
}

/// `DELETE /api/policy/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "Policy")?;
    policies::delete(&*state.store, &state.uploads, &id).await?;
    Ok(Json(MessageResponse::ok("Policy deleted successfully")))
}
