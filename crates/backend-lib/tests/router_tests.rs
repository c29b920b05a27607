//! HTTP surface tests driven through `tower::ServiceExt::oneshot`.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use backend_lib::{
    auth::{DefaultAuth, TokenIssuer, TokenSettings},
    clock::ManualClock,
    config::Settings,
    mail::LogMailer,
    router::create_router,
    storage::MemoryStore,
    AppState,
};
use common::{setup_test_env, ADMIN_EMAIL, ADMIN_PASSWORD, TEST_SECRET};
use lem_common::RESET_REQUESTED_MESSAGE;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let env = setup_test_env().await;
    let app = create_router(env.state.clone());

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let env = setup_test_env().await;
    let app = create_router(env.state.clone());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap();
    let claims = env.tokens.validate_token(access).unwrap();
    assert_eq!(claims.role.as_deref(), Some("super_admin"));
    assert!(body["refresh_token"].is_string());

    let (wrong_status, wrong_body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": ADMIN_EMAIL, "password": "nope" }),
        ),
    )
    .await;
    let (missing_status, missing_body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "ghost@x.test", "password": "nope" }),
        ),
    )
    .await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, missing_status);
    assert_eq!(wrong_body, missing_body);
    assert_eq!(wrong_body["error"]["code"], "AUTH_001");
}

#[tokio::test]
async fn test_forgot_password_same_body_for_unknown_email() {
    let env = setup_test_env().await;
    let app = create_router(env.state.clone());

    let (known_status, known) = send(
        &app,
        post_json("/api/v1/auth/forgot-password", json!({ "email": ADMIN_EMAIL })),
    )
    .await;
    let (unknown_status, unknown) = send(
        &app,
        post_json("/api/v1/auth/forgot-password", json!({ "email": "ghost@x.test" })),
    )
    .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known, unknown);
    assert_eq!(known["message"], RESET_REQUESTED_MESSAGE);
}

#[tokio::test]
async fn test_full_reset_over_http() {
    let env = setup_test_env().await;
    let app = create_router(env.state.clone());

    send(
        &app,
        post_json("/api/v1/auth/forgot-password", json!({ "email": ADMIN_EMAIL })),
    )
    .await;
    let code = env.mailer.next_code_for(ADMIN_EMAIL).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/verify-otp",
            json!({ "email": ADMIN_EMAIL, "code": code }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reset_token = body["reset_token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/reset-password",
            json!({ "reset_token": reset_token, "new_password": "NewPass1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": ADMIN_EMAIL, "password": "NewPass1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/verify-otp",
            json!({ "email": ADMIN_EMAIL, "code": code }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_002");
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let env = setup_test_env().await;
    let app = create_router(env.state.clone());

    for request in [
        post_json("/api/v1/auth/forgot-password", json!({ "email": "not-an-email" })),
        post_json(
            "/api/v1/auth/reset-password",
            json!({ "reset_token": "t", "new_password": "short" }),
        ),
        post_json("/api/v1/auth/verify-otp", json!({ "email": ADMIN_EMAIL, "code": "" })),
        post_json("/api/v1/auth/login", json!({ "email": ADMIN_EMAIL })),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VAL_001");
    }
}

#[tokio::test]
async fn test_reset_with_access_token_is_rejected() {
    let env = setup_test_env().await;
    let app = create_router(env.state.clone());
    let login = env
        .state
        .auth
        .login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/reset-password",
            json!({ "reset_token": login.access_token, "new_password": "NewPass1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_003");
}

#[tokio::test]
async fn test_google_redirect_and_callback() {
    let env = setup_test_env().await;
    let app = create_router(env.state.clone());

    let response = app
        .clone()
        .oneshot(get("/api/v1/auth/google/login"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://idp.test/authorize?state="));

    let (status, body) = send(&app, get("/api/v1/auth/google/callback?code=valid-code")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "grace@x.test");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["access_token"].is_string());

    let (status, body) = send(&app, get("/api/v1/auth/google/callback?code=forged")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_001");

    let (status, _) = send(&app, get("/api/v1/auth/google/callback")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_google_routes_absent_without_provider() {
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(MemoryStore::new());
    let tokens = Arc::new(TokenIssuer::new(TokenSettings::new(TEST_SECRET), clock.clone()));
    let auth = Arc::new(DefaultAuth::from_parts(
        store.clone(),
        Arc::new(LogMailer),
        tokens,
        clock,
        None,
    ));
    let state = Arc::new(AppState::with_auth(Settings::default(), store, auth));
    let app = create_router(state);

    let (status, _) = send(&app, get("/api/v1/auth/google/login")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/api/v1/auth/google/callback?code=x")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
