//! Response envelopes.
//!
//! Every body carries `success`; errors add `error` and `message`.

use lifesure_core::models::auth::{Admin, User};
use lifesure_core::models::claim::{ClaimStats, ClaimView};
use lifesure_core::models::policy::{Policy, PolicyListing};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub admin: Admin,
}

/// Account directory. Never carries password hashes.
#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub success: bool,
    pub users: Vec<User>,
    pub admins: Vec<Admin>,
}

#[derive(Debug, Serialize)]
pub struct PolicyListResponse {
    pub success: bool,
    pub policies: Vec<PolicyListing>,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub policy: Policy,
}

#[derive(Debug, Serialize)]
pub struct ClaimListResponse {
    pub success: bool,
    pub claims: Vec<ClaimView>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub claim: ClaimView,
}

#[derive(Debug, Serialize)]
pub struct ClaimStatsResponse {
    pub success: bool,
    pub stats: ClaimStats,
}
