//! Integration tests for the admin registration surface.

mod common;

use std::collections::HashSet;

use axum::http::{Method, StatusCode};
use common::{
    registration_body, seed_code, send_admin, send_admin_json, send_json, setup_app,
    unique_test_email,
};
use uuid::Uuid;

/// Registers a participant and returns (registration_id, email).
async fn register_one(app: &axum::Router, pool: &sqlx::PgPool) -> (String, String) {
    let code = seed_code(pool, 72).await;
    let email = unique_test_email();
    let (status, body) = send_json(
        app,
        Method::POST,
        "/api/v1/register",
        registration_body(&code, &email),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "setup failed: {}", body);
    (body["registration_id"].as_str().unwrap().to_string(), email)
}

#[tokio::test]
async fn test_list_registrations_filters_by_email() {
    let (app, pool) = setup_app().await;
    let (registration_id, email) = register_one(&app, &pool).await;

    let (status, body) = send_admin(
        &app,
        Method::GET,
        &format!("/api/v1/admin/registrations?email={}", email),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], registration_id.as_str());
    assert_eq!(data[0]["email"], email.as_str());
    assert_eq!(data[0]["status"], "confirmed");
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn test_list_registrations_filters_by_status() {
    let (app, pool) = setup_app().await;
    let (registration_id, email) = register_one(&app, &pool).await;

    let (status, _) = send_admin_json(
        &app,
        Method::PATCH,
        &format!("/api/v1/admin/registrations/{}/status", registration_id),
        serde_json::json!({ "status": "cancelled" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Status + email narrows to this row
    let (status, body) = send_admin(
        &app,
        Method::GET,
        &format!("/api/v1/admin/registrations?status=cancelled&email={}", email),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // A confirmed filter on the same email matches nothing
    let (status, body) = send_admin(
        &app,
        Method::GET,
        &format!("/api/v1/admin/registrations?status=confirmed&email={}", email),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_registrations_pages_do_not_overlap() {
    let (app, pool) = setup_app().await;
    for _ in 0..3 {
        register_one(&app, &pool).await;
    }

    let (status, first_page) =
        send_admin(&app, Method::GET, "/api/v1/admin/registrations?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let first_ids: HashSet<String> = first_page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(first_ids.len(), 2);
    let cursor = first_page["next_cursor"].as_str().unwrap().to_string();

    let (status, second_page) = send_admin(
        &app,
        Method::GET,
        &format!("/api/v1/admin/registrations?limit=2&cursor={}", cursor),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second_ids: HashSet<String> = second_page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();

    assert!(first_ids.is_disjoint(&second_ids));
}

#[tokio::test]
async fn test_list_registrations_rejects_bad_filters() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_admin(
        &app,
        Method::GET,
        "/api/v1/admin/registrations?email=not-an-email",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) =
        send_admin(&app, Method::GET, "/api/v1/admin/registrations?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_admin(
        &app,
        Method::GET,
        "/api/v1/admin/registrations?cursor=garbage",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_detail_returns_full_record() {
    let (app, pool) = setup_app().await;
    let (registration_id, email) = register_one(&app, &pool).await;

    let (status, body) = send_admin(
        &app,
        Method::GET,
        &format!("/api/v1/admin/registrations/{}", registration_id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], registration_id.as_str());
    assert_eq!(body["status"], "confirmed");
    assert!(body["participant_id"].as_str().unwrap().starts_with("TS"));
    assert!(body["qr_payload"].as_str().is_some());
    assert!(body["checked_in_at"].is_null());

    let participant = &body["participant"];
    assert_eq!(participant["email"], email.as_str());
    assert_eq!(participant["first_name"], "Aminata");
    assert_eq!(participant["phone"], "+23276123456");
    assert_eq!(participant["age"], 24);
}

#[tokio::test]
async fn test_registration_detail_unknown_id_not_found() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_admin(
        &app,
        Method::GET,
        &format!("/api/v1/admin/registrations/{}", Uuid::new_v4()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_status_transitions_only_leave_confirmed() {
    let (app, pool) = setup_app().await;
    let (registration_id, _) = register_one(&app, &pool).await;
    let uri = format!("/api/v1/admin/registrations/{}/status", registration_id);

    // confirmed -> attended is allowed
    let (status, body) = send_admin_json(
        &app,
        Method::PATCH,
        &uri,
        serde_json::json!({ "status": "attended" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["status"], "attended");

    // attended never moves again
    let (status, body) = send_admin_json(
        &app,
        Method::PATCH,
        &uri,
        serde_json::json!({ "status": "cancelled" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_cancelled_registration_is_terminal() {
    let (app, pool) = setup_app().await;
    let (registration_id, _) = register_one(&app, &pool).await;
    let uri = format!("/api/v1/admin/registrations/{}/status", registration_id);

    let (status, body) = send_admin_json(
        &app,
        Method::PATCH,
        &uri,
        serde_json::json!({ "status": "cancelled" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["status"], "cancelled");

    let (status, body) = send_admin_json(
        &app,
        Method::PATCH,
        &uri,
        serde_json::json!({ "status": "attended" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_update_status_unknown_id_not_found() {
    let (app, _pool) = setup_app().await;

    let (status, _) = send_admin_json(
        &app,
        Method::PATCH,
        &format!("/api/v1/admin/registrations/{}/status", Uuid::new_v4()),
        serde_json::json!({ "status": "cancelled" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resend_confirmation_queues_email() {
    let (app, pool) = setup_app().await;
    let (registration_id, email) = register_one(&app, &pool).await;

    let (status, body) = send_admin(
        &app,
        Method::POST,
        &format!("/api/v1/admin/registrations/{}/resend", registration_id),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["registration_id"], registration_id.as_str());
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["queued"], true);
}

#[tokio::test]
async fn test_resend_confirmation_unknown_id_not_found() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send_admin(
        &app,
        Method::POST,
        &format!("/api/v1/admin/registrations/{}/resend", Uuid::new_v4()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_pool_status_reports_usage() {
    let (app, pool) = setup_app().await;
    register_one(&app, &pool).await;

    let (status, body) =
        send_admin(&app, Method::GET, "/api/v1/admin/participant-ids").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prefix"], "TS");
    assert_eq!(body["usage"]["capacity"], 200);
    assert!(body["usage"]["used"].as_u64().unwrap() >= 1);
    let preview = body["next_available"].as_array().unwrap();
    assert!(preview.len() <= 10);
    for id in preview {
        assert!(id.as_str().unwrap().starts_with("TS"));
    }
}

#[tokio::test]
async fn test_admin_registration_surface_requires_key() {
    let (app, _pool) = setup_app().await;

    let (status, _) = common::send_get(&app, "/api/v1/admin/registrations").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::send_get(&app, "/api/v1/admin/participant-ids").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
