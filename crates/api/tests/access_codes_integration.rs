//! Integration tests for admin access-code management.

mod common;

use std::collections::HashSet;

use axum::http::{Method, StatusCode};
use common::{
    registration_body, seed_code, seed_expired_code, seed_used_code, send_admin, send_admin_json,
    send_json, setup_app, unique_code, unique_test_email,
};
use domain::models::access_code::is_well_formed;

fn batch_body(count: u32) -> serde_json::Value {
    serde_json::json!({ "count": count })
}

#[tokio::test]
async fn test_create_batch_issues_requested_count() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_admin_json(
        &app,
        Method::POST,
        "/api/v1/admin/access-codes",
        serde_json::json!({ "count": 5, "expiry_hours": 48, "event_name": "Tech Summit" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["total_requested"], 5);
    assert_eq!(body["success_count"], 5);
    assert_eq!(body["issued"].as_array().unwrap().len(), 5);
    assert!(body["errors"].as_array().unwrap().is_empty());

    for issued in body["issued"].as_array().unwrap() {
        let code = issued["code"].as_str().unwrap();
        assert!(is_well_formed(code), "issued a malformed code: {}", code);
        assert_eq!(issued["is_used"], false);
    }
}

#[tokio::test]
async fn test_batch_codes_are_unique() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_admin_json(
        &app,
        Method::POST,
        "/api/v1/admin/access-codes",
        batch_body(50),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let codes: HashSet<&str> = body["issued"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes.len(), 50);
}

#[tokio::test]
async fn test_create_batch_rejects_bad_counts() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_admin_json(
        &app,
        Method::POST,
        "/api/v1/admin/access-codes",
        batch_body(0),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send_admin_json(
        &app,
        Method::POST,
        "/api/v1/admin/access-codes",
        batch_body(501),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_endpoints_require_key() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/admin/access-codes",
        batch_body(1),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = common::send_get(&app, "/api/v1/admin/access-codes").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_codes_pages_do_not_overlap() {
    let (app, _pool) = setup_app().await;

    let (status, _) = send_admin_json(
        &app,
        Method::POST,
        "/api/v1/admin/access-codes",
        batch_body(5),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, first_page) =
        send_admin(&app, Method::GET, "/api/v1/admin/access-codes?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let first_codes: HashSet<String> = first_page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(first_codes.len(), 2);
    let cursor = first_page["next_cursor"].as_str().unwrap().to_string();

    let (status, second_page) = send_admin(
        &app,
        Method::GET,
        &format!("/api/v1/admin/access-codes?limit=2&cursor={}", cursor),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second_codes: HashSet<String> = second_page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap().to_string())
        .collect();

    assert!(first_codes.is_disjoint(&second_codes));
}

#[tokio::test]
async fn test_list_codes_rejects_bad_paging_input() {
    let (app, _pool) = setup_app().await;

    let (status, body) =
        send_admin(&app, Method::GET, "/api/v1/admin/access-codes?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) =
        send_admin(&app, Method::GET, "/api/v1/admin/access-codes?limit=1000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_admin(
        &app,
        Method::GET,
        "/api/v1/admin/access-codes?cursor=not-a-cursor",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_code_stats_identity_holds() {
    let (app, pool) = setup_app().await;
    seed_code(&pool, 72).await;
    seed_used_code(&pool, 72).await;

    let (status, body) =
        send_admin(&app, Method::GET, "/api/v1/admin/access-codes/stats").await;

    assert_eq!(status, StatusCode::OK);
    let total = body["total"].as_i64().unwrap();
    let unused = body["unused"].as_i64().unwrap();
    let used = body["used"].as_i64().unwrap();
    let expired = body["expired"].as_i64().unwrap();
    assert_eq!(total, unused + used + expired);
    assert!(unused >= 1);
    assert!(used >= 1);
}

#[tokio::test]
async fn test_release_returns_stuck_code_to_pool() {
    let (app, pool) = setup_app().await;
    let code = seed_used_code(&pool, 72).await;

    let (status, body) = send_admin(
        &app,
        Method::POST,
        &format!("/api/v1/admin/access-codes/{}/release", code),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["code"], code.as_str());
    assert_eq!(body["status"], "unused");
    assert!(body["used_at"].is_null());

    // The code is redeemable again
    let (status, verify) = common::send_get(&app, &format!("/api/v1/verify/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verify["valid"], true);
}

#[tokio::test]
async fn test_release_refused_when_code_backs_a_registration() {
    let (app, pool) = setup_app().await;
    let code = seed_code(&pool, 72).await;

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v1/register",
        registration_body(&code, &unique_test_email()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_admin(
        &app,
        Method::POST,
        &format!("/api/v1/admin/access-codes/{}/release", code),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_release_unknown_code_not_found() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_admin(
        &app,
        Method::POST,
        &format!("/api/v1/admin/access-codes/{}/release", unique_code()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_release_malformed_code_rejected() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_admin(
        &app,
        Method::POST,
        "/api/v1/admin/access-codes/nope/release",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_cleanup_sweeps_expired_codes_only() {
    let (app, pool) = setup_app().await;
    let first = seed_expired_code(&pool).await;
    let second = seed_expired_code(&pool).await;
    let live = seed_code(&pool, 72).await;

    let (status, body) = send_admin(&app, Method::DELETE, "/api/v1/admin/cleanup").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["deleted_count"].as_u64().unwrap() >= 2);

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM access_codes WHERE code IN ($1, $2)")
            .bind(&first)
            .bind(&second)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, 0);

    let survivors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM access_codes WHERE code = $1")
        .bind(&live)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(survivors, 1);
}
