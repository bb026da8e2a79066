//! Route paths.

pub const GET_ROOT: &str = "/";

pub const POST_AUTH_REGISTER: &str = "/api/auth/register";
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const GET_AUTH_PROFILE: &str = "/api/auth/profile";

pub const POST_ADMIN_REGISTER: &str = "/api/admin/register";
pub const POST_ADMIN_LOGIN: &str = "/api/admin/login";
pub const GET_ADMIN_ME: &str = "/api/admin/me";
pub const GET_ADMIN_USERS: &str = "/api/admin/users";

pub const ADMIN_CLAIMS: &str = "/api/admin/claims";
pub const GET_ADMIN_CLAIMS_STATS: &str = "/api/admin/claims/stats";
pub const ADMIN_CLAIMS_ID: &str = "/api/admin/claims/{id}";
pub const PATCH_ADMIN_CLAIMS_ID_STATUS: &str = "/api/admin/claims/{id}/status";

pub const POST_CLAIMS_CREATE: &str = "/api/claims/create";
pub const GET_CLAIMS: &str = "/api/claims";
pub const DELETE_CLAIMS_ID: &str = "/api/claims/{id}";

pub const POLICY: &str = "/api/policy";
pub const GET_POLICY_MY_POLICIES: &str = "/api/policy/my-policies";
pub const POLICY_ID: &str = "/api/policy/{id}";
pub const POST_POLICY_ID_PURCHASE: &str = "/api/policy/{id}/purchase";

pub const UPLOADS: &str = "/uploads";
