//! Policy catalog: creation with images, personalised listings, purchases.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{FilePart, delete, get, multipart_request};
use lifesure_core::models::policy::PurchaseStatus;
use lifesure_core::policies::PolicyStore;
use uuid::Uuid;

#[tokio::test]
async fn create_list_and_purchase_flow() {
    let app = common::app();
    let (admin, admin_id) = app.admin("a@x.com").await;
    let policy = app.policy(&admin, "Family Shield", true).await;
    let id = policy["id"].as_str().unwrap().to_string();
    let image_url = policy["imageUrl"].as_str().unwrap();
    assert!(image_url.starts_with("http://localhost:5000/uploads/policies/"));
    assert_eq!(policy["createdBy"], admin_id.as_str());
    assert!(app.upload_path(image_url).exists());

    // Anonymous listing omits the personal flags.
    let (status, body) = app.send(get("/api/policy", None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = &body["policies"][0];
    assert_eq!(listed["id"], id.as_str());
    assert!(listed.get("isPurchased").is_none());
    assert!(listed.get("hasClaim").is_none());

    let (user, user_id) = app.user("buyer@x.com").await;
    let (status, body) = app
        .send(common::json_request(
            Method::POST,
            &format!("/api/policy/{id}/purchase"),
            Some(&user),
            serde_json::json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["policy"]["purchasedBy"][0]["userId"], user_id.as_str());
    assert_eq!(body["policy"]["purchasedBy"][0]["status"], "Active");

    let (_, body) = app.send(get("/api/policy", Some(&user))).await;
    let listed = &body["policies"][0];
    assert_eq!(listed["isPurchased"], true);
    assert_eq!(listed["hasClaim"], false);

    let (status, body) = app.send(get("/api/policy/my-policies", Some(&user))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["policies"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unusable_token_on_listing_is_treated_as_anonymous() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    app.policy(&admin, "Basic", false).await;
    let (status, body) = app.send(get("/api/policy", Some("garbage"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["policies"][0].get("isPurchased").is_none());
}

#[tokio::test]
async fn listing_is_newest_first() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    app.policy(&admin, "First", false).await;
    app.policy(&admin, "Second", false).await;
    let (_, body) = app.send(get("/api/policy", None)).await;
    assert_eq!(body["policies"][0]["title"], "Second");
    assert_eq!(body["policies"][1]["title"], "First");
}

#[tokio::test]
async fn second_active_purchase_conflicts_until_it_lapses() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    let policy = app.policy(&admin, "Term", false).await;
    let id = policy["id"].as_str().unwrap();
    let (user, user_id) = app.user("u@x.com").await;
    let purchase = || {
        common::json_request(
            Method::POST,
            &format!("/api/policy/{id}/purchase"),
            Some(&user),
            serde_json::json!({}),
        )
    };

    assert_eq!(app.send(purchase()).await.0, StatusCode::OK);
    let (status, body) = app.send(purchase()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");

    let policy_id = Uuid::parse_str(id).unwrap();
    let user_id = Uuid::parse_str(&user_id).unwrap();
    assert!(
        app.store
            .set_purchase_status(&policy_id, &user_id, PurchaseStatus::Expired)
            .await
            .unwrap()
    );
    let (status, body) = app.send(purchase()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["policy"]["purchasedBy"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_purchases_yield_exactly_one_success() {
    let app = Arc::new(common::app());
    let (admin, _) = app.admin("a@x.com").await;
    let policy = app.policy(&admin, "Race", false).await;
    let id = policy["id"].as_str().unwrap().to_string();
    let (user, _) = app.user("racer@x.com").await;

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let app = app.clone();
            let uri = format!("/api/policy/{id}/purchase");
            let user = user.clone();
            tokio::spawn(async move {
                app.send(common::json_request(
                    Method::POST,
                    &uri,
                    Some(&user),
                    serde_json::json!({}),
                ))
                .await
                .0
            })
        })
        .collect();

    let mut ok = 0;
    for task in tasks {
        if task.await.unwrap() == StatusCode::OK {
            ok += 1;
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test]
async fn purchase_of_unknown_policy_is_not_found() {
    let app = common::app();
    let (user, _) = app.user("u@x.com").await;
    for id in [Uuid::now_v7().to_string(), "not-an-id".to_string()] {
        let (status, _) = app
            .send(common::json_request(
                Method::POST,
                &format!("/api/policy/{id}/purchase"),
                Some(&user),
                serde_json::json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn catalog_writes_need_an_admin() {
    let app = common::app();
    let (user, _) = app.user("u@x.com").await;
    let fields = [
        ("title", "T"),
        ("description", "D"),
        ("plan", "P"),
        ("duration", "1 year"),
    ];
    let (status, _) = app
        .send(multipart_request(Method::POST, "/api/policy", Some(&user), &fields, &[]))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .send(multipart_request(Method::POST, "/api/policy", None, &fields, &[]))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_fields_are_rejected_without_storing_the_image() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    let (status, body) = app
        .send(multipart_request(
            Method::POST,
            "/api/policy",
            Some(&admin),
            &[("title", "Only a title")],
            &[FilePart::png("image")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(app.stored_files("policies"), 0);
}

#[tokio::test]
async fn wrong_image_type_is_rejected() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    let fields = [
        ("title", "T"),
        ("description", "D"),
        ("plan", "P"),
        ("duration", "1 year"),
    ];
    let (status, body) = app
        .send(multipart_request(
            Method::POST,
            "/api/policy",
            Some(&admin),
            &fields,
            &[FilePart::pdf("image")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn oversized_image_is_payload_too_large() {
    let app = common::app_with_limit(8);
    let (admin, _) = app.admin("a@x.com").await;
    let fields = [
        ("title", "T"),
        ("description", "D"),
        ("plan", "P"),
        ("duration", "1 year"),
    ];
    let (status, body) = app
        .send(multipart_request(
            Method::POST,
            "/api/policy",
            Some(&admin),
            &fields,
            &[FilePart {
                field: "image",
                file_name: "big.png",
                content_type: "image/png",
                bytes: &[0u8; 64],
            }],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "payload_too_large");
    assert_eq!(app.stored_files("policies"), 0);
}

#[tokio::test]
async fn update_merges_fields_and_replaces_the_image() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    let policy = app.policy(&admin, "Old title", true).await;
    let id = policy["id"].as_str().unwrap();
    let old_image = app.upload_path(policy["imageUrl"].as_str().unwrap());
    assert!(old_image.exists());

    let (status, body) = app
        .send(multipart_request(
            Method::PUT,
            &format!("/api/policy/{id}"),
            Some(&admin),
            &[("title", "New title"), ("plan", "")],
            &[FilePart::png("image")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["policy"]["title"], "New title");
    assert_eq!(body["policy"]["plan"], "Gold");
    let new_image = app.upload_path(body["policy"]["imageUrl"].as_str().unwrap());
    assert!(new_image.exists());
    assert!(!old_image.exists());
    assert_eq!(app.stored_files("policies"), 1);
}

#[tokio::test]
async fn update_of_missing_policy_keeps_no_new_file() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    let (status, _) = app
        .send(multipart_request(
            Method::PUT,
            &format!("/api/policy/{}", Uuid::now_v7()),
            Some(&admin),
            &[("title", "x")],
            &[FilePart::png("image")],
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.stored_files("policies"), 0);
}

#[tokio::test]
async fn delete_removes_the_stored_image() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    let policy = app.policy(&admin, "With image", true).await;
    let image_url = policy["imageUrl"].as_str().unwrap();
    let image = app.upload_path(image_url);
    let path = image_url.trim_start_matches("http://localhost:5000");
    assert_eq!(app.fetch(path).await.0, StatusCode::OK);

    let id = policy["id"].as_str().unwrap();
    let (status, body) = app
        .send(delete(&format!("/api/policy/{id}"), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!image.exists());

    let (status, _) = app.send(get(&format!("/api/policy/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_without_image_still_succeeds() {
    let app = common::app();
    let (admin, _) = app.admin("a@x.com").await;
    let policy = app.policy(&admin, "Plain", false).await;
    assert!(policy["imageUrl"].is_null());
    let id = policy["id"].as_str().unwrap();
    let (status, _) = app
        .send(delete(&format!("/api/policy/{id}"), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stored_files("policies"), 0);

    let (status, _) = app
        .send(delete(&format!("/api/policy/{id}"), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
