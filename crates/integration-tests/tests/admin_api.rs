//! Admin HTTP API tests.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`emporium migrate`)
//! - The admin server running (`cargo run -p emporium-admin`)
//! - `AUTH_JWT_SECRET` matching the server's
//!
//! Run with: `cargo test -p emporium-integration-tests -- --ignored`

use reqwest::StatusCode;
use serde_json::{Value, json};

use emporium_integration_tests::{admin_base_url, client, storefront_base_url, token};

fn super_admin() -> String {
    token(1, "Integration Admin", &["all"])
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_api_requires_token() {
    let resp = client()
        .get(format!("{}/api/categories", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and AUTH_JWT_SECRET"]
async fn test_permission_is_checked() {
    let resp = client()
        .get(format!("{}/api/roles", admin_base_url()))
        .bearer_auth(token(2, "Catalog Only", &["products:*"]))
        .send()
        .await
        .expect("Failed to get roles");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running admin server and AUTH_JWT_SECRET"]
async fn test_category_lifecycle() {
    let base_url = admin_base_url();
    let client = client();
    let auth = super_admin();

    let resp = client
        .post(format!("{base_url}/api/categories"))
        .bearer_auth(&auth)
        .json(&json!({
            "name": "Integration Root",
            "description": "Created by integration tests",
            "image": "https://cdn.example.com/root.jpg"
        }))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let root: Value = resp.json().await.expect("Failed to parse JSON");

    let resp = client
        .post(format!("{base_url}/api/categories"))
        .bearer_auth(&auth)
        .json(&json!({
            "name": "Integration Child",
            "description": "Nested",
            "image": "https://cdn.example.com/child.jpg",
            "parent": root["id"]
        }))
        .send()
        .await
        .expect("Failed to create child");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let child: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(child["ancestors"][0]["id"], root["id"]);

    // Parent with children cannot go first.
    let resp = client
        .delete(format!("{base_url}/api/categories/{}", root["id"]))
        .bearer_auth(&auth)
        .send()
        .await
        .expect("Failed to delete root");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    for id in [&child["id"], &root["id"]] {
        let resp = client
            .delete(format!("{base_url}/api/categories/{id}"))
            .bearer_auth(&auth)
            .send()
            .await
            .expect("Failed to delete category");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and AUTH_JWT_SECRET"]
async fn test_missing_parent_is_unprocessable() {
    let resp = client()
        .post(format!("{}/api/categories", admin_base_url()))
        .bearer_auth(super_admin())
        .json(&json!({
            "name": "Orphan",
            "description": "Parent does not exist",
            "image": "https://cdn.example.com/orphan.jpg",
            "parent": 2_000_000_000
        }))
        .send()
        .await
        .expect("Failed to create category");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running admin and storefront servers and AUTH_JWT_SECRET"]
async fn test_categories_named_like_navigation_are_reachable() {
    let base_url = admin_base_url();
    let client = client();
    let auth = super_admin();

    for name in ["Nav", "Tree"] {
        let resp = client
            .post(format!("{base_url}/api/categories"))
            .bearer_auth(&auth)
            .json(&json!({
                "name": name,
                "description": "Named like a navigation endpoint",
                "image": "https://cdn.example.com/nav.jpg"
            }))
            .send()
            .await
            .expect("Failed to create category");
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = resp.json().await.expect("Failed to parse JSON");

        let slug = created["slug"].as_str().expect("slug");
        let resp = client
            .get(format!("{}/api/categories/{slug}", storefront_base_url()))
            .send()
            .await
            .expect("Failed to get category");
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched: Value = resp.json().await.expect("Failed to parse JSON");
        assert_eq!(fetched["id"], created["id"]);

        client
            .delete(format!("{base_url}/api/categories/{}", created["id"]))
            .bearer_auth(&auth)
            .send()
            .await
            .expect("Failed to delete category");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and AUTH_JWT_SECRET"]
async fn test_concurrent_settings_patches_are_both_kept() {
    let base_url = admin_base_url();
    let client = client();
    let auth = super_admin();
    let put = |body: Value| {
        client
            .put(format!("{base_url}/api/settings"))
            .bearer_auth(&auth)
            .json(&body)
            .send()
    };

    for round in 0..10 {
        let phone = format!("+1 555 01{round:02}");
        let font = format!("font-{round}");
        let (a, b) = tokio::join!(put(json!({ "phone": phone })), put(json!({ "font": font })));
        assert_eq!(a.expect("Failed to patch phone").status(), StatusCode::OK);
        assert_eq!(b.expect("Failed to patch font").status(), StatusCode::OK);

        let settings: Value = client
            .get(format!("{base_url}/api/settings"))
            .bearer_auth(&auth)
            .send()
            .await
            .expect("Failed to get settings")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(settings["phone"], phone);
        assert_eq!(settings["font"], font);
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and AUTH_JWT_SECRET"]
async fn test_product_with_unknown_category_is_unprocessable() {
    let resp = client()
        .post(format!("{}/api/products", admin_base_url()))
        .bearer_auth(super_admin())
        .json(&json!({
            "name": "Nowhere Speaker",
            "description": "Category does not exist",
            "base_price": "49.00",
            "category_id": 2_000_000_000,
            "media": [{ "type": "image", "url": "https://cdn.example.com/s.jpg" }]
        }))
        .send()
        .await
        .expect("Failed to create product");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running admin server and AUTH_JWT_SECRET"]
async fn test_dashboard_counts() {
    let resp = client()
        .get(format!("{}/api/dashboard", admin_base_url()))
        .bearer_auth(super_admin())
        .send()
        .await
        .expect("Failed to get dashboard");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    assert!(body["products"].is_i64());
    assert!(body["average_rating"].is_number());
}
