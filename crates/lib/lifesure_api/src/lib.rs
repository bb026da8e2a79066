//! # lifesure_api
//!
//! HTTP API library for LifeSure.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod multipart;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use lifesure_core::store::Store;
use lifesure_core::uploads::{CLAIM_DOCUMENTS, UploadStorage};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::ApiConfig;
use crate::handlers::{admin, admin_claims, auth, claims, health, policies};
use crate::services::auth::TokenSettings;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend.
    pub store: Arc<dyn Store>,
    /// API configuration.
    pub config: ApiConfig,
    /// Upload storage rooted at `config.upload_dir`.
    pub uploads: UploadStorage,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: ApiConfig) -> Self {
        let uploads = UploadStorage::new(
            &config.upload_dir,
            &config.public_base_url,
            config.max_file_bytes,
        );
        Self {
            store,
            config,
            uploads,
        }
    }

    pub fn token_settings(&self) -> TokenSettings<'_> {
        TokenSettings {
            secret: self.config.jwt_secret.as_bytes(),
            ttl_secs: self.config.token_ttl_secs,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `lifesure_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    lifesure_core::migrate::migrate(pool).await
}

/// Largest legitimate body: a full batch of claim documents plus text fields.
fn body_limit(max_file_bytes: usize) -> usize {
    max_file_bytes
        .saturating_mul(CLAIM_DOCUMENTS.max_files)
        .saturating_add(1024 * 1024)
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_body = body_limit(state.config.max_file_bytes);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_ROOT, get(health::health))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_ADMIN_REGISTER, post(admin::register_handler))
        .route(routes::POST_ADMIN_LOGIN, post(admin::login_handler))
        .route(routes::POLICY_ID, get(policies::get_handler));

    // Public, personalised when a valid token is presented
    let personalised = Router::new()
        .route(routes::POLICY, get(policies::list_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::identify,
        ));

    // Any authenticated account
    let user = Router::new()
        .route(routes::GET_AUTH_PROFILE, get(auth::profile_handler))
        .route(routes::GET_POLICY_MY_POLICIES, get(policies::mine_handler))
        .route(
            routes::POST_POLICY_ID_PURCHASE,
            post(policies::purchase_handler),
        )
        .route(routes::POST_CLAIMS_CREATE, post(claims::create_handler))
        .route(routes::GET_CLAIMS, get(claims::list_handler))
        .route(
            routes::DELETE_CLAIMS_ID,
            axum::routing::delete(claims::delete_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user,
        ));

    // Administrators only
    let admin = Router::new()
        .route(routes::GET_ADMIN_ME, get(admin::me_handler))
        .route(routes::GET_ADMIN_USERS, get(admin::users_handler))
        .route(
            routes::ADMIN_CLAIMS,
            get(admin_claims::list_handler).post(admin_claims::create_handler),
        )
        .route(
            routes::GET_ADMIN_CLAIMS_STATS,
            get(admin_claims::stats_handler),
        )
        .route(
            routes::ADMIN_CLAIMS_ID,
            get(admin_claims::get_handler)
                .put(admin_claims::update_handler)
                .delete(admin_claims::delete_handler),
        )
        .route(
            routes::PATCH_ADMIN_CLAIMS_ID_STATUS,
            patch(admin_claims::status_handler),
        )
        .route(routes::POLICY, post(policies::create_handler))
        .route(
            routes::POLICY_ID,
            axum::routing::put(policies::update_handler).delete(policies::delete_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .merge(public)
        .merge(personalised)
        .merge(user)
        .merge(admin)
        .nest_service(routes::UPLOADS, ServeDir::new(&state.config.upload_dir))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .with_state(state)
}
