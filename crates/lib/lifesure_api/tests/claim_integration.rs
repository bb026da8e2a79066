//! Claim ledger: filing, review, ownership and statistics.

mod common;

use axum::http::{Method, StatusCode};
use common::{FilePart, TestApp, delete, get, json_request, multipart_request};
use lifesure_core::claims::ClaimStore;
use lifesure_core::models::claim::ClaimFilter;
use serde_json::{Value, json};

struct Fixture {
    app: TestApp,
    admin: String,
    admin_id: String,
    user: String,
    user_id: String,
    policy_id: String,
}

async fn fixture() -> Fixture {
    let app = common::app();
    let (admin, admin_id) = app.admin("admin@x.com").await;
    let (user, user_id) = app.user("holder@x.com").await;
    let policy = app.policy(&admin, "Health Plus", false).await;
    let policy_id = policy["id"].as_str().unwrap().to_string();
    Fixture {
        app,
        admin,
        admin_id,
        user,
        user_id,
        policy_id,
    }
}

impl Fixture {
    async fn file_as_user(&self, amount: &str, files: &[FilePart<'_>]) -> (StatusCode, Value) {
        let fields = [
            ("policyId", self.policy_id.as_str()),
            ("claimType", "Hospitalisation"),
            ("claimAmount", amount),
            ("incidentDate", "2026-02-10"),
            ("description", "Three nights in hospital"),
        ];
        self.app
            .send(multipart_request(
                Method::POST,
                "/api/claims/create",
                Some(&self.user),
                &fields,
                files,
            ))
            .await
    }

    async fn file_as_admin(&self, amount: &str) -> Value {
        let fields = [
            ("policyId", self.policy_id.as_str()),
            ("userId", self.user_id.as_str()),
            ("claimType", "Accident"),
            ("claimAmount", amount),
            ("incidentDate", "2026-03-01T09:30:00Z"),
            ("description", "Fracture"),
        ];
        let (status, body) = self
            .app
            .send(multipart_request(
                Method::POST,
                "/api/admin/claims",
                Some(&self.admin),
                &fields,
                &[],
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["claim"].clone()
    }

    async fn claim_count(&self) -> usize {
        self.app
            .store
            .list_claims(&ClaimFilter::default())
            .await
            .unwrap()
            .len()
    }
}

#[tokio::test]
async fn user_files_a_claim_with_documents() {
    let f = fixture().await;
    let (status, body) = f
        .file_as_user("2500.50", &[FilePart::pdf("documents"), FilePart::png("documents")])
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let claim = &body["claim"];
    assert_eq!(claim["status"], "Pending");
    assert_eq!(claim["claimAmount"], 2500.5);
    assert_eq!(claim["userId"], f.user_id.as_str());
    assert_eq!(claim["filedBy"], f.user_id.as_str());
    assert!(claim["reviewedBy"].is_null());
    assert!(claim["claimNumber"].as_str().unwrap().starts_with("CLM-"));
    assert_eq!(claim["claimant"]["email"], "holder@x.com");
    assert_eq!(claim["policy"]["title"], "Health Plus");
    let documents = claim["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    for doc in documents {
        assert!(f.app.upload_path(doc.as_str().unwrap()).exists());
    }

    // The listing now reports the claim against the policy.
    let (_, body) = f.app.send(get("/api/policy", Some(&f.user))).await;
    assert_eq!(body["policies"][0]["hasClaim"], true);
}

#[tokio::test]
async fn holder_cannot_file_a_decided_claim() {
    let f = fixture().await;
    let (status, body) = f
        .app
        .send(multipart_request(
            Method::POST,
            "/api/claims/create",
            Some(&f.user),
            &[
                ("policyId", f.policy_id.as_str()),
                ("claimType", "Hospitalisation"),
                ("claimAmount", "5000"),
                ("incidentDate", "2026-02-10"),
                ("description", "Self-approved"),
                ("status", "Approved"),
            ],
            &[FilePart::pdf("documents")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(f.claim_count().await, 0);
    assert_eq!(f.app.stored_files("claims"), 0);

    let (_, body) = f
        .app
        .send(get("/api/admin/claims/stats", Some(&f.admin)))
        .await;
    assert_eq!(body["stats"]["approvedClaims"], 0);
}

#[tokio::test]
async fn non_numeric_amount_is_rejected_without_a_record() {
    let f = fixture().await;
    let (status, body) = f.file_as_user("abc", &[FilePart::pdf("documents")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("claimAmount"));
    assert_eq!(f.claim_count().await, 0);
    assert_eq!(f.app.stored_files("claims"), 0);
}

#[tokio::test]
async fn claim_against_unknown_policy_is_not_found() {
    let f = fixture().await;
    let unknown = uuid::Uuid::now_v7().to_string();
    let (status, _) = f
        .app
        .send(multipart_request(
            Method::POST,
            "/api/claims/create",
            Some(&f.user),
            &[
                ("policyId", unknown.as_str()),
                ("claimType", "Other"),
                ("claimAmount", "10"),
                ("incidentDate", "2026-01-01"),
                ("description", "x"),
            ],
            &[],
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(f.claim_count().await, 0);
}

#[tokio::test]
async fn unsupported_document_type_is_rejected() {
    let f = fixture().await;
    let script = FilePart {
        field: "documents",
        file_name: "notes.txt",
        content_type: "text/plain",
        bytes: b"hello",
    };
    let (status, body) = f.file_as_user("100", &[script]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(f.claim_count().await, 0);
    assert_eq!(f.app.stored_files("claims"), 0);
}

#[tokio::test]
async fn claim_for_unknown_user_is_not_found() {
    let f = fixture().await;
    let stranger = uuid::Uuid::now_v7().to_string();
    let (status, body) = f
        .app
        .send(multipart_request(
            Method::POST,
            "/api/admin/claims",
            Some(&f.admin),
            &[
                ("policyId", f.policy_id.as_str()),
                ("userId", stranger.as_str()),
                ("claimType", "Other"),
                ("claimAmount", "10"),
                ("incidentDate", "2026-01-01"),
                ("description", "x"),
            ],
            &[],
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    assert_eq!(f.claim_count().await, 0);
}

#[tokio::test]
async fn too_many_documents_are_rejected() {
    let f = fixture().await;
    let files: Vec<_> = (0..11).map(|_| FilePart::pdf("documents")).collect();
    let (status, body) = f.file_as_user("100", &files).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(f.claim_count().await, 0);
}

#[tokio::test]
async fn user_claim_routes_require_a_token() {
    let f = fixture().await;
    let (status, _) = f.app.send(get("/api/claims", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_only_see_and_delete_their_own_claims() {
    let f = fixture().await;
    let (_, body) = f.file_as_user("100", &[FilePart::pdf("documents")]).await;
    let claim_id = body["claim"]["id"].as_str().unwrap().to_string();
    let document = f.app.upload_path(body["claim"]["documents"][0].as_str().unwrap());

    let (other, _) = f.app.user("other@x.com").await;
    let (_, body) = f.app.send(get("/api/claims", Some(&other))).await;
    assert!(body["claims"].as_array().unwrap().is_empty());

    let (status, _) = f
        .app
        .send(delete(&format!("/api/claims/{claim_id}"), Some(&other)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(f.claim_count().await, 1);

    let (_, body) = f.app.send(get("/api/claims", Some(&f.user))).await;
    assert_eq!(body["claims"].as_array().unwrap().len(), 1);

    let (status, _) = f
        .app
        .send(delete(&format!("/api/claims/{claim_id}"), Some(&f.user)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(f.claim_count().await, 0);
    assert!(!document.exists());
}

#[tokio::test]
async fn admin_files_on_behalf_of_a_user() {
    let f = fixture().await;
    let claim = f.file_as_admin("900").await;
    assert_eq!(claim["userId"], f.user_id.as_str());
    assert_eq!(claim["filedBy"], f.admin_id.as_str());
    assert_eq!(claim["incidentDate"], "2026-03-01");
    assert!(claim["reviewedBy"].is_null());
    assert!(claim["reviewedAt"].is_null());
}

#[tokio::test]
async fn status_update_stamps_the_reviewer() {
    let f = fixture().await;
    let claim = f.file_as_admin("900").await;
    let id = claim["id"].as_str().unwrap();

    let (status, body) = f
        .app
        .send(json_request(
            Method::PATCH,
            &format!("/api/admin/claims/{id}/status"),
            Some(&f.admin),
            json!({"status": "Under Review", "adminRemarks": "Need bills"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claim"]["status"], "Under Review");
    assert_eq!(body["claim"]["adminRemarks"], "Need bills");
    assert_eq!(body["claim"]["reviewedBy"], f.admin_id.as_str());
    assert!(body["claim"]["reviewedAt"].is_string());

    // Remarks survive a later status change that omits them.
    let (_, body) = f
        .app
        .send(json_request(
            Method::PATCH,
            &format!("/api/admin/claims/{id}/status"),
            Some(&f.admin),
            json!({"status": "Approved"}),
        ))
        .await;
    assert_eq!(body["claim"]["status"], "Approved");
    assert_eq!(body["claim"]["adminRemarks"], "Need bills");
}

#[tokio::test]
async fn unknown_status_leaves_the_claim_unchanged() {
    let f = fixture().await;
    let claim = f.file_as_admin("900").await;
    let id = claim["id"].as_str().unwrap();

    let (status, body) = f
        .app
        .send(json_request(
            Method::PATCH,
            &format!("/api/admin/claims/{id}/status"),
            Some(&f.admin),
            json!({"status": "Closed"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (_, body) = f
        .app
        .send(get(&format!("/api/admin/claims/{id}"), Some(&f.admin)))
        .await;
    assert_eq!(body["claim"]["status"], "Pending");
    assert!(body["claim"]["reviewedBy"].is_null());
}

#[tokio::test]
async fn partial_update_keeps_absent_fields() {
    let f = fixture().await;
    let claim = f.file_as_admin("900").await;
    let id = claim["id"].as_str().unwrap();

    let (status, body) = f
        .app
        .send(json_request(
            Method::PUT,
            &format!("/api/admin/claims/{id}"),
            Some(&f.admin),
            json!({"claimAmount": "1200"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claim"]["claimAmount"], 1200.0);
    assert_eq!(body["claim"]["description"], "Fracture");
    assert_eq!(body["claim"]["status"], "Pending");

    let (status, _) = f
        .app
        .send(json_request(
            Method::PUT,
            &format!("/api/admin/claims/{id}"),
            Some(&f.admin),
            json!({"claimAmount": "lots"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_listing_filters_and_enriches() {
    let f = fixture().await;
    let first = f.file_as_admin("100").await;
    f.file_as_admin("200").await;
    let id = first["id"].as_str().unwrap();
    f.app
        .send(json_request(
            Method::PATCH,
            &format!("/api/admin/claims/{id}/status"),
            Some(&f.admin),
            json!({"status": "Rejected"}),
        ))
        .await;

    let (status, body) = f.app.send(get("/api/admin/claims", Some(&f.admin))).await;
    assert_eq!(status, StatusCode::OK);
    let claims = body["claims"].as_array().unwrap();
    assert_eq!(claims.len(), 2);
    assert_eq!(claims[0]["claimAmount"], 200.0);
    assert_eq!(claims[0]["claimant"]["name"], "Ravi Kumar");
    assert_eq!(claims[0]["policy"]["plan"], "Gold");

    let (_, body) = f
        .app
        .send(get("/api/admin/claims?status=Rejected", Some(&f.admin)))
        .await;
    assert_eq!(body["claims"].as_array().unwrap().len(), 1);

    let (status, _) = f
        .app
        .send(get("/api/admin/claims?status=Closed", Some(&f.admin)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_cover_the_whole_ledger() {
    let f = fixture().await;
    let first = f.file_as_admin("100").await;
    f.file_as_admin("50").await;
    f.file_as_user("25", &[]).await;
    let id = first["id"].as_str().unwrap();
    f.app
        .send(json_request(
            Method::PATCH,
            &format!("/api/admin/claims/{id}/status"),
            Some(&f.admin),
            json!({"status": "Approved"}),
        ))
        .await;

    let (status, body) = f
        .app
        .send(get("/api/admin/claims/stats", Some(&f.admin)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["stats"];
    assert_eq!(stats["totalClaims"], 3);
    assert_eq!(stats["pendingClaims"], 2);
    assert_eq!(stats["approvedClaims"], 1);
    assert_eq!(stats["rejectedClaims"], 0);
    assert_eq!(stats["totalAmount"], 175.0);
    assert_eq!(stats["amountByStatus"]["Approved"], 100.0);
    assert_eq!(stats["amountByStatus"]["Under Review"], 0.0);
}

#[tokio::test]
async fn admin_delete_and_missing_claims() {
    let f = fixture().await;
    let claim = f.file_as_admin("100").await;
    let id = claim["id"].as_str().unwrap();

    let (status, _) = f
        .app
        .send(delete(&format!("/api/admin/claims/{id}"), Some(&f.admin)))
        .await;
    assert_eq!(status, StatusCode::OK);

    for uri in [
        format!("/api/admin/claims/{id}"),
        "/api/admin/claims/not-a-uuid".to_string(),
    ] {
        let (status, body) = f.app.send(get(&uri, Some(&f.admin))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
    let (status, _) = f
        .app
        .send(delete(&format!("/api/admin/claims/{id}"), Some(&f.admin)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
