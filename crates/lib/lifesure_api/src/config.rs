//! API server configuration.

use std::path::PathBuf;

/// Configuration for the API server. Built once at startup, then read-only.
///
/// The server binary fills it from flags or the environment:
///
/// | Variable          | Default                                |
/// |-------------------|----------------------------------------|
/// | `BIND_ADDR`       | `0.0.0.0:5000`                         |
/// | `JWT_SECRET`      | generated & persisted to file          |
/// | `UPLOAD_DIR`      | `uploads`                              |
/// | `PUBLIC_BASE_URL` | `http://localhost:<port of BIND_ADDR>` |
/// | `TOKEN_TTL_SECS`  | `86400`                                |
/// | `MAX_FILE_BYTES`  | `5242880`                              |
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:5000").
    pub bind_addr: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Directory holding uploaded files, served under `/uploads`.
    pub upload_dir: PathBuf,
    /// Base URL prefixed to stored file references.
    pub public_base_url: String,
    /// Access token lifetime, identical for users and administrators.
    pub token_ttl_secs: i64,
    /// Per-file upload cap in bytes.
    pub max_file_bytes: usize,
}

/// `http://localhost:<port>` for a `host:port` bind address.
pub fn default_public_base_url(bind_addr: &str) -> String {
    let port = bind_addr.rsplit_once(':').map_or("5000", |(_, p)| p);
    format!("http://localhost:{port}")
}
