//! Authentication middleware: Bearer token extraction, JWT verification and
//! role guards.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use lifesure_core::auth::jwt::verify_access_token;
use lifesure_core::models::auth::{Role, TokenClaims};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;

/// Identity resolved from a verified token, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Identity for routes that personalise output but never require it.
#[derive(Debug, Clone, Default)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl TryFrom<TokenClaims> for AuthenticatedUser {
    type Error = AppError;

    fn try_from(claims: TokenClaims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token. Please login again.".into()))?;
        Ok(Self {
            id,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("No token provided. Authorization denied.".into()))?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))
}

fn verify(state: &AppState, headers: &HeaderMap) -> Result<TokenClaims, AppError> {
    let token = bearer_token(headers)?;
    Ok(verify_access_token(token, state.config.jwt_secret.as_bytes())?)
}

/// Any valid token, user or administrator.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify(&state, request.headers())?;
    let user = AuthenticatedUser::try_from(claims)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// A valid administrator token whose account still exists.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify(&state, request.headers())?;
    let denied = || AppError::Forbidden("Access denied. Admin privileges required.".into());

    if claims.role != Role::Admin || !claims.is_admin {
        warn!(id = %claims.sub, role = %claims.role, "admin access denied: not an admin token");
        return Err(denied());
    }
    let user = AuthenticatedUser::try_from(claims)?;
    if state.store.get_admin_by_id(&user.id).await?.is_none() {
        warn!(id = %user.id, role = %user.role, "admin access denied: no such admin");
        return Err(denied());
    }

    info!(id = %user.id, email = %user.email, "admin access granted");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Attach identity when a valid token is present; otherwise continue
/// anonymously.
pub async fn identify(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = if request.headers().contains_key(AUTHORIZATION) {
        match verify(&state, request.headers()).and_then(AuthenticatedUser::try_from) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!("ignoring unusable token on public route: {e}");
                None
            }
        }
    } else {
        None
    };
    request.extensions_mut().insert(OptionalUser(user));
    next.run(request).await
}
