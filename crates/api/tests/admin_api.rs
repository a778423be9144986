//! HTTP-level integration tests for the admin endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get_auth, post_json, post_multipart_auth, Part};
use sqlx::PgPool;

/// A user token is rejected by every admin route with 403.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_routes_reject_user_role(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, _) = common::register_user(app, "pleb@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/admin/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/admin/stats", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Admin listing is paginated with the standard envelope.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_user_listing_paginates(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (admin_token, _) = common::create_admin(app, &pool, "admin@x.com").await;

    for i in 0..5 {
        let app = common::build_test_app(pool.clone());
        common::register_user(app, &format!("u{i}@x.com"), "pw1-long-enough").await;
    }

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/admin/users?page=1&limit=3", &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["items"].as_array().unwrap().len(), 3);
    assert_eq!(json["pagination"]["page"], 1);
    assert_eq!(json["pagination"]["limit"], 3);
    assert_eq!(json["pagination"]["total"], 6, "five users plus the admin");
    assert_eq!(json["pagination"]["totalPages"], 2);

    // Listed users carry no password material.
    assert!(json["items"][0].get("password_hash").is_none());

    // Second page holds the remainder.
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/admin/users?page=2&limit=3", &admin_token).await;
    let json = body_json(response).await;
    assert_eq!(json["items"].as_array().unwrap().len(), 3);
}

/// Stats aggregates users, predictions, and images.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_stats_counts(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (admin_token, _) = common::create_admin(app, &pool, "boss@x.com").await;

    let app = common::build_test_app(pool.clone());
    let (user_token, _) = common::register_user(app, "worker@x.com", "pw1-long-enough").await;

    // One submission with two images.
    let parts = vec![
        Part::Text(
            "detections",
            serde_json::json!([
                { "class": "monocyte", "confidence": 0.8, "imageIndex": 0 },
                { "class": "basophil", "confidence": 0.7, "imageIndex": 1 }
            ])
            .to_string(),
        ),
        Part::Text("persist_mode", "full".to_string()),
        Part::File("files".to_string(), "a.png".to_string(), "image/png", b"img-a".to_vec()),
        Part::File("files".to_string(), "b.png".to_string(), "image/png", b"img-b".to_vec()),
    ];
    let app = common::build_test_app(pool.clone());
    let response = post_multipart_auth(app, "/api/v1/predictions", &user_token, parts).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/admin/stats", &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["data"]["totalUsers"], 2);
    assert_eq!(json["data"]["totalPredictions"], 1);
    assert_eq!(json["data"]["totalImages"], 2);
    assert_eq!(json["data"]["predictionsLast24h"], 1);
}

/// Deactivation locks the account out of login with 403.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_deactivates_user(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (admin_token, admin_id) = common::create_admin(app, &pool, "hr@x.com").await;

    let app = common::build_test_app(pool.clone());
    let (_, user_id) = common::register_user(app, "leaver@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/admin/users/{user_id}"), &admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The deactivated account can no longer sign in.
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "email": "leaver@x.com", "password": "pw1-long-enough" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Self-deactivation is refused.
    let app = common::build_test_app(pool);
    let response = delete_auth(app, &format!("/api/v1/admin/users/{admin_id}"), &admin_token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Admins can read another user's prediction (owner-or-admin visibility).
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_can_read_any_prediction(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (admin_token, _) = common::create_admin(app, &pool, "root@x.com").await;

    let app = common::build_test_app(pool.clone());
    let (user_token, _) = common::register_user(app, "subject@x.com", "pw1-long-enough").await;

    let parts = vec![
        Part::Text(
            "detections",
            serde_json::json!([{ "class": "lymphocyte", "confidence": 0.6, "imageIndex": 0 }])
                .to_string(),
        ),
        Part::Text("persist_mode", "full".to_string()),
        Part::File("files".to_string(), "x.png".to_string(), "image/png", b"img-x".to_vec()),
    ];
    let app = common::build_test_app(pool.clone());
    let response = post_multipart_auth(app, "/api/v1/predictions", &user_token, parts).await;
    let json = body_json(response).await;
    let prediction_id = json["predictionId"].as_i64().unwrap();

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/predictions/{prediction_id}"),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
