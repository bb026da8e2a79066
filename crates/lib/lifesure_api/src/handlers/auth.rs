//! Policy-holder authentication handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use lifesure_core::auth::registration::{LoginRequest, UserRegistration};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserResponse;
use crate::services::auth;

/// `POST /api/auth/register`: create a policy-holder account.
pub async fn register_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<UserRegistration>, AppError>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = auth::register_user(&*state.store, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            message: Some("Registration successful".into()),
            token: None,
            user,
        }),
    ))
}

/// `POST /api/auth/login`: exchange credentials for an access token.
pub async fn login_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<UserResponse>> {
    let (token, user) = auth::login_user(&*state.store, &body, state.token_settings()).await?;
    Ok(Json(UserResponse {
        success: true,
        message: Some("Login successful".into()),
        token: Some(token),
        user,
    }))
}

/// `GET /api/auth/profile`: the caller's stored profile.
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserResponse>> {
    let user = auth::profile(&*state.store, &user.id).await?;
    Ok(Json(UserResponse {
        success: true,
        message: None,
        token: None,
        user,
    }))
}
