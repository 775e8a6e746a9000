//! Management API tests
//!
//! 认证、所有权与统一响应信封。

mod common;

use actix_web::App;
use actix_web::http::{Method, StatusCode, header};
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use common::{ADMIN_KEY, ALICE_KEY, BOB_KEY, harness, harness_with, test_config};
use go_short_link::api::services::ErrorCode;
use go_short_link::config::AuthConfig;
use go_short_link::runtime::modes::server::configure_app;

macro_rules! init_app {
    ($h:expr) => {{
        let services = $h.app_services();
        let config = $h.config.clone();
        test::init_service(App::new().configure(move |cfg| configure_app(cfg, &services, &config)))
            .await
    }};
}

fn bearer(key: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", key))
}

fn api(method: Method, path: &str, key: Option<&str>) -> TestRequest {
    let req = TestRequest::default()
        .method(method)
        .uri(&format!("/api/v1{}", path));
    match key {
        Some(key) => req.insert_header(bearer(key)),
        None => req,
    }
}

// =============================================================================
// Authentication
// =============================================================================

#[actix_web::test]
async fn test_missing_token_is_401() {
    let h = harness();
    let app = init_app!(h);

    let resp = test::call_service(&app, api(Method::GET, "/links", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::Unauthorized as i32);
}

#[actix_web::test]
async fn test_invalid_token_is_401() {
    let h = harness();
    let app = init_app!(h);

    let resp = test::call_service(
        &app,
        api(Method::GET, "/links", Some("wrong-key")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_api_disabled_without_keys() {
    let mut config = test_config();
    config.auth = AuthConfig::default();
    let h = harness_with(config);
    let app = init_app!(h);

    let resp = test::call_service(
        &app,
        api(Method::GET, "/links", Some("anything")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Create / Read
// =============================================================================

#[actix_web::test]
async fn test_create_link_returns_201() {
    let h = harness();
    let app = init_app!(h);

    let req = api(Method::POST, "/links", Some(ALICE_KEY))
        .set_json(json!({ "target_url": "https://example.com/a", "custom_code": "alpha" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["code"], "alpha");
    assert_eq!(body["data"]["target_url"], "https://example.com/a");
    assert_eq!(body["data"]["owner"], "alice");
    assert_eq!(body["data"]["state"], "active");

    let resp = test::call_service(&app, TestRequest::get().uri("/alpha").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[actix_web::test]
async fn test_owner_cannot_spoof_owner_field() {
    let h = harness();
    let app = init_app!(h);

    let req = api(Method::POST, "/links", Some(ALICE_KEY))
        .set_json(json!({ "target_url": "https://example.com", "owner": "bob" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["owner"], "alice");

    // 管理员可以代为指定
    let req = api(Method::POST, "/links", Some(ADMIN_KEY))
        .set_json(json!({ "target_url": "https://example.com", "owner": "bob" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["owner"], "bob");
}

#[actix_web::test]
async fn test_create_generated_code() {
    let h = harness();
    let app = init_app!(h);

    let req = api(Method::POST, "/links", Some(ALICE_KEY))
        .set_json(json!({ "target_url": "https://example.com/generated" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let code = body["data"]["code"].as_str().unwrap();
    assert_eq!(code.len(), h.config.generator.length);
}

#[actix_web::test]
async fn test_create_conflict_is_409() {
    let h = harness();
    let app = init_app!(h);

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let req = api(Method::POST, "/links", Some(ALICE_KEY))
            .set_json(json!({ "target_url": "https://example.com", "custom_code": "dup" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
        if expected == StatusCode::CONFLICT {
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["code"], ErrorCode::LinkAlreadyExists as i32);
        }
    }
}

#[actix_web::test]
async fn test_create_validation_is_400() {
    let h = harness();
    let app = init_app!(h);

    let req = api(Method::POST, "/links", Some(ALICE_KEY))
        .set_json(json!({ "target_url": "javascript:alert(1)" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::LinkValidationFailed as i32);
}

#[actix_web::test]
async fn test_malformed_json_is_400_envelope() {
    let h = harness();
    let app = init_app!(h);

    let req = api(Method::POST, "/links", Some(ALICE_KEY))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::BadRequest as i32);
}

#[actix_web::test]
async fn test_store_outage_on_create_is_503() {
    let h = harness();
    h.store.set_failing(true);
    let app = init_app!(h);

    let req = api(Method::POST, "/links", Some(ALICE_KEY))
        .set_json(json!({ "target_url": "https://example.com", "custom_code": "x1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Ownership
// =============================================================================

#[actix_web::test]
async fn test_other_owner_gets_403() {
    let h = harness();
    let app = init_app!(h);

    let req = api(Method::POST, "/links", Some(ALICE_KEY))
        .set_json(json!({ "target_url": "https://example.com", "custom_code": "private" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    for req in [
        api(Method::GET, "/links/private", Some(BOB_KEY)),
        api(Method::DELETE, "/links/private", Some(BOB_KEY)),
        api(Method::PATCH, "/links/private", Some(BOB_KEY))
            .set_json(json!({ "target_url": "https://evil.example" })),
    ] {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    let resp = test::call_service(&app, TestRequest::get().uri("/private").to_request()).await;
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "https://example.com");
}

#[actix_web::test]
async fn test_disable_and_enable() {
    let h = harness();
    let app = init_app!(h);

    let req = api(Method::POST, "/links", Some(ALICE_KEY))
        .set_json(json!({ "target_url": "https://example.com", "custom_code": "toggle" }))
        .to_request();
    test::call_service(&app, req).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        api(Method::DELETE, "/links/toggle", Some(ALICE_KEY)).to_request(),
    )
    .await;
    assert_eq!(body["data"]["state"], "disabled");

    let resp = test::call_service(&app, TestRequest::get().uri("/toggle").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::call_and_read_body_json(
        &app,
        api(Method::POST, "/links/toggle/enable", Some(ALICE_KEY)).to_request(),
    )
    .await;
    assert_eq!(body["data"]["state"], "active");

    let resp = test::call_service(&app, TestRequest::get().uri("/toggle").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[actix_web::test]
async fn test_unknown_link_is_404_envelope() {
    let h = harness();
    let app = init_app!(h);

    let resp = test::call_service(
        &app,
        api(Method::GET, "/links/ghost", Some(ADMIN_KEY)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::LinkNotFound as i32);
}

#[actix_web::test]
async fn test_list_links_scoped_and_paginated() {
    let h = harness();
    let app = init_app!(h);

    for (code, key) in [("l1", ALICE_KEY), ("l2", ALICE_KEY), ("l3", ALICE_KEY), ("l4", BOB_KEY)] {
        let req = api(Method::POST, "/links", Some(key))
            .set_json(json!({ "target_url": "https://example.com", "custom_code": code }))
            .to_request();
        test::call_service(&app, req).await;
    }

    let body: Value = test::call_and_read_body_json(
        &app,
        api(Method::GET, "/links?page=1&page_size=2", Some(ALICE_KEY)).to_request(),
    )
    .await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let body: Value = test::call_and_read_body_json(
        &app,
        api(Method::GET, "/links", Some(ADMIN_KEY)).to_request(),
    )
    .await;
    assert_eq!(body["data"]["total"], 4);
}

// =============================================================================
// Health
// =============================================================================

#[actix_web::test]
async fn test_health_endpoints() {
    let h = harness();
    let app = init_app!(h);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["storage"]["backend"], "memory");

    let resp = test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    h.store.set_failing(true);
    let resp = test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
