//! Administrator authentication and account directory handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use lifesure_core::auth::registration::{AdminRegistration, LoginRequest};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AdminResponse, DirectoryResponse};
use crate::services::auth;

/// `POST /api/admin/register`
pub async fn register_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<AdminRegistration>, AppError>,
) -> AppResult<(StatusCode, Json<AdminResponse>)> {
    let admin = auth::register_admin(&*state.store, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(AdminResponse {
            success: true,
            message: Some("Registration successful! Please login.".into()),
            token: None,
            admin,
        }),
    ))
}

/// `POST /api/admin/login`
pub async fn login_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<AdminResponse>> {
    let (token, admin) = auth::login_admin(&*state.store, &body, state.token_settings()).await?;
    Ok(Json(AdminResponse {
        success: true,
        message: Some("Login successful".into()),
        token: Some(token),
        admin,
    }))
}

/// `GET /api/admin/me`
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<AdminResponse>> {
    let admin = auth::current_admin(&*state.store, &user.id).await?;
    Ok(Json(AdminResponse {
        success: true,
        message: None,
        token: None,
        admin,
    }))
}

/// `GET /api/admin/users`: every account, without password hashes.
pub async fn users_handler(State(state): State<AppState>) -> AppResult<Json<DirectoryResponse>> {
    let (users, admins) = auth::directory(&*state.store).await?;
    Ok(Json(DirectoryResponse {
        success: true,
        users,
        admins,
    }))
}
