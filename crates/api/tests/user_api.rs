//! HTTP-level integration tests for profile and avatar endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_bytes, body_json, delete_auth, get_auth, patch_json_auth, post_json, post_multipart_auth,
    put_json_auth, Part,
};
use leukoscan_db::repositories::{UserImageRepo, UserRepo};
use sqlx::PgPool;

fn avatar_part(bytes: Vec<u8>) -> Vec<Part> {
    vec![Part::File(
        "file".to_string(),
        "me.jpg".to_string(),
        "image/jpeg",
        bytes,
    )]
}

/// GET /users/me returns the profile without any credential material.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_me_returns_profile(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, user_id) = common::register_user(app, "me@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/users/me", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], user_id);
    assert_eq!(json["data"]["email"], "me@x.com");
    assert!(json["data"].get("password_hash").is_none());
}

/// PATCH /users/me updates name and email.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_profile(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, _) = common::register_user(app, "old@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool);
    let response = patch_json_auth(
        app,
        "/api/v1/users/me",
        &token,
        serde_json::json!({ "email": "new@x.com", "name": "Renamed" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "new@x.com");
    assert_eq!(json["data"]["name"], "Renamed");
}

/// Taking another user's email surfaces as 409.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_profile_email_conflict(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    common::register_user(app, "taken@x.com", "pw1-long-enough").await;
    let app = common::build_test_app(pool.clone());
    let (token, _) = common::register_user(app, "mine@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool);
    let response = patch_json_auth(
        app,
        "/api/v1/users/me",
        &token,
        serde_json::json!({ "email": "taken@x.com" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Password change requires the current password, rehashes, and revokes
/// sessions; the old password stops working.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_change_password_flow(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, _) = common::register_user(app, "pw@x.com", "pw1-long-enough").await;

    // Wrong current password is rejected.
    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        "/api/v1/users/me/password",
        &token,
        serde_json::json!({ "current_password": "wrong", "new_password": "pw2-long-enough" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct current password succeeds.
    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        "/api/v1/users/me/password",
        &token,
        serde_json::json!({
            "current_password": "pw1-long-enough",
            "new_password": "pw2-long-enough"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Old password no longer logs in; the new one does.
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "email": "pw@x.com", "password": "pw1-long-enough" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "email": "pw@x.com", "password": "pw2-long-enough" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Avatar upload round-trips, and uploading twice still leaves exactly one
/// `is_profile` row (delete-then-insert idempotence).
#[sqlx::test(migrations = "../db/migrations")]
async fn test_avatar_replace_is_idempotent(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, user_id) = common::register_user(app, "av@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool.clone());
    let response = post_multipart_auth(
        app,
        "/api/v1/users/me/avatar",
        &token,
        avatar_part(b"first-avatar".to_vec()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let response = post_multipart_auth(
        app,
        "/api/v1/users/me/avatar",
        &token,
        avatar_part(b"second-avatar".to_vec()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let profile_rows = UserImageRepo::count_profile_rows(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(profile_rows, 1, "exactly one profile image row after two uploads");

    // The served avatar is the latest payload.
    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/users/{user_id}/avatar"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    assert_eq!(body_bytes(response).await, b"second-avatar");
}

/// A user with no avatar yields 404.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_missing_avatar_is_404(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, user_id) = common::register_user(app, "noav@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/users/{user_id}/avatar"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// An oversized avatar rejects the request (no batch to fall back to).
#[sqlx::test(migrations = "../db/migrations")]
async fn test_oversized_avatar_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, user_id) = common::register_user(app, "fat@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool.clone());
    let response = post_multipart_auth(
        app,
        "/api/v1/users/me/avatar",
        &token,
        avatar_part(vec![0u8; 5 * 1024 * 1024 + 1]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let profile_rows = UserImageRepo::count_profile_rows(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(profile_rows, 0);
}

/// The account-delete flow removes the user and cascades owned data.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_account_delete(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, user_id) = common::register_user(app, "gone@x.com", "pw1-long-enough").await;

    let app = common::build_test_app(pool.clone());
    let response = post_multipart_auth(
        app,
        "/api/v1/users/me/avatar",
        &token,
        avatar_part(b"avatar".to_vec()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, "/api/v1/users/me", &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(UserRepo::find_by_id(&pool, user_id).await.unwrap().is_none());
    let rows = UserImageRepo::count_profile_rows(&pool, user_id).await.unwrap();
    assert_eq!(rows, 0, "user images must cascade with the account");
}
