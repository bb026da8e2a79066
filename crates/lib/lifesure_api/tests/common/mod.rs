//! Shared harness: a router over the in-memory store with a temp upload dir.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use lifesure_api::{AppState, config::ApiConfig};
use lifesure_core::store::MemoryStore;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";
const BOUNDARY: &str = "lifesure-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub upload_dir: TempDir,
}

/// A file part for multipart requests.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> FilePart<'a> {
    pub fn png(field: &'a str) -> Self {
        Self {
            field,
            file_name: "photo.png",
            content_type: "image/png",
            bytes: b"\x89PNG\r\n\x1a\nfake",
        }
    }

    pub fn pdf(field: &'a str) -> Self {
        Self {
            field,
            file_name: "bill.pdf",
            content_type: "application/pdf",
            bytes: b"%PDF-1.4 fake",
        }
    }
}

pub fn app() -> TestApp {
    app_with_limit(1024 * 1024)
}

pub fn app_with_limit(max_file_bytes: usize) -> TestApp {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let upload_dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(MemoryStore::new());
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        jwt_secret: SECRET.into(),
        upload_dir: upload_dir.path().to_path_buf(),
        public_base_url: "http://localhost:5000".into(),
        token_ttl_secs: 3600,
        max_file_bytes,
    };
    let router = lifesure_api::router(AppState::new(store.clone(), config));
    TestApp {
        router,
        store,
        upload_dir,
    }
}

impl TestApp {
    /// Send a request and decode the JSON body (`Null` when empty).
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("parse JSON")
        };
        (status, json)
    }

    /// Raw status and bytes, for static file checks.
    pub async fn fetch(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = self.router.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, body.to_vec())
    }

    /// Local path of a stored upload URL.
    pub fn upload_path(&self, url: &str) -> PathBuf {
        let (_, relative) = url.split_once("/uploads/").expect("upload url");
        self.upload_dir.path().join(relative)
    }

    /// Number of files stored under `scope`.
    pub fn stored_files(&self, scope: &str) -> usize {
        std::fs::read_dir(self.upload_dir.path().join(scope))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn register_user(&self, email: &str) -> (StatusCode, Value) {
        self.send(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            user_body(email),
        ))
        .await
    }

    /// Register and log in a policy holder, returning `(token, id)`.
    pub async fn user(&self, email: &str) -> (String, String) {
        let (status, _) = self.register_user(email).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/auth/login",
                None,
                json!({"email": email, "password": "password123"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Register and log in an administrator, returning `(token, id)`.
    pub async fn admin(&self, email: &str) -> (String, String) {
        let (status, _) = self
            .send(json_request(
                Method::POST,
                "/api/admin/register",
                None,
                json!({"name": "Admin", "email": email, "phoneNumber": "1", "password": "secret12"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/admin/login",
                None,
                json!({"email": email, "password": "secret12"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["token"].as_str().unwrap().to_string(),
            body["admin"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Create a policy as `admin_token`, returning the policy JSON.
    pub async fn policy(&self, admin_token: &str, title: &str, image: bool) -> Value {
        let fields = [
            ("title", title),
            ("description", "Cover for the whole family"),
            ("plan", "Gold"),
            ("duration", "10 years"),
        ];
        let files = if image {
            vec![FilePart::png("image")]
        } else {
            vec![]
        };
        let (status, body) = self
            .send(multipart_request(
                Method::POST,
                "/api/policy",
                Some(admin_token),
                &fields,
                &files,
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["policy"].clone()
    }
}

pub fn user_body(email: &str) -> Value {
    json!({
        "name": "Ravi Kumar",
        "email": email,
        "password": "password123",
        "phone": "9876543210",
        "gender": "male",
        "dob": "1990-05-17",
        "city": "Pune",
        "state": "MH",
        "pinCode": "411001"
    })
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(t) => builder.header(header::AUTHORIZATION, format!("Bearer {t}")),
        None => builder,
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method(Method::DELETE).uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    files: &[FilePart<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    with_auth(Request::builder().method(method).uri(uri), token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
