//! Credential auth surface: registration, login, profile, token handling,
//! rate limiting, health and the 404 fallback.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;
use server_core::domains::auth::models::Role;
use server_core::kernel::UserStore;

fn register_body() -> serde_json::Value {
    json!({
        "fullName": "Asha Verma",
        "email": "asha@example.com",
        "password": "Secret123",
        "confirmPassword": "Secret123",
        "mobileNumber": "9811122233",
    })
}

#[tokio::test]
async fn register_persists_hashed_credential() {
    let app = TestApp::new();

    let (status, body) = app.post("/api/auth/register", None, register_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["tokenType"], "Bearer");
    // Credential fields never surface.
    assert!(body["data"]["user"].get("passwordHash").is_none());

    // The stored record carries a bcrypt hash, not the plaintext.
    let user = app
        .deps
        .users
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.password_hash.starts_with("$2"));
    assert_ne!(user.password_hash, "Secret123");
    assert_eq!(user.role, Role::Citizen);
}

#[tokio::test]
async fn register_collects_field_errors() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "fullName": "X",
                "email": "not-an-email",
                "password": "weak",
                "confirmPassword": "different",
                "mobileNumber": "123",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation errors occurred");

    let errors = body["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"fullName"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"confirmPassword"));
    assert!(fields.contains(&"mobileNumber"));
}

#[tokio::test]
async fn register_rejects_duplicate_email_and_mobile() {
    let app = TestApp::new();
    app.post("/api/auth/register", None, register_body()).await;

    // Same email, different mobile.
    let mut body = register_body();
    body["mobileNumber"] = json!("9899988877");
    let (status, response) = app.post("/api/auth/register", None, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(response["message"].as_str().unwrap().contains("email"));

    // Same mobile, different email.
    let mut body = register_body();
    body["email"] = json!("other@example.com");
    let (status, response) = app.post("/api/auth/register", None, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(response["message"].as_str().unwrap().contains("mobile"));
}

#[tokio::test]
async fn login_round_trip() {
    let app = TestApp::new();
    app.post("/api/auth/register", None, register_body()).await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "asha@example.com", "password": "Secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert!(body["data"]["user"]["lastLogin"].is_null());

    // Wrong password and unknown user are indistinguishable.
    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "asha@example.com", "password": "Wrong123" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": "Secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn login_updates_last_login() {
    let app = TestApp::new();
    app.post("/api/auth/register", None, register_body()).await;
    app.post(
        "/api/auth/login",
        None,
        json!({ "email": "asha@example.com", "password": "Secret123" }),
    )
    .await;

    let user = app
        .deps
        .users
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.last_login.is_some());
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/auth/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token is required");

    let (status, body) = app.get("/api/auth/profile", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn profile_excludes_credential_fields() {
    let app = TestApp::new();
    let user = app
        .create_user("me@example.com", "+919000000011", Role::Citizen)
        .await;
    let token = app.token_for(&user);

    let (status, body) = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "me@example.com");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn verify_token_echoes_claims() {
    let app = TestApp::new();
    let user = app
        .create_user("me@example.com", "+919000000011", Role::Official)
        .await;
    let token = app.token_for(&user);

    let (status, body) = app.get("/api/auth/verify-token", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userId"], user.id.to_string());
    assert_eq!(body["data"]["role"], "official");
    assert_eq!(body["data"]["mobileNumber"], "+919000000011");
}

#[tokio::test]
async fn logout_is_a_stateless_acknowledgment() {
    let app = TestApp::new();
    let user = app
        .create_user("me@example.com", "+919000000011", Role::Citizen)
        .await;
    let token = app.token_for(&user);

    let (status, body) = app
        .post("/api/auth/logout", Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");

    // The token still works afterwards - logout is client-side.
    let (status, _) = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_is_rate_limited_per_address() {
    let app = TestApp::new();

    let hit = |app: &TestApp| {
        let router = app.router.clone();
        async move {
            use tower::ServiceExt;
            let request = axum::http::Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .header("x-forwarded-for", "203.0.113.50")
                .body(axum::body::Body::from(
                    json!({ "email": "a@b.com", "password": "x" }).to_string(),
                ))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        }
    };

    for _ in 0..5 {
        let status = hit(&app).await;
        assert_ne!(status, StatusCode::TOO_MANY_REQUESTS);
    }
    assert_eq!(hit(&app).await, StatusCode::TOO_MANY_REQUESTS);

    // A different address still has budget.
    use tower::ServiceExt;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.51")
        .body(axum::body::Body::from(
            json!({ "email": "a@b.com", "password": "x" }).to_string(),
        ))
        .unwrap();
    let status = app.router.clone().oneshot(request).await.unwrap().status();
    assert_ne!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn health_reports_backend() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["storage"]["backend"], "memory (fallback)");
}

#[tokio::test]
async fn unmatched_routes_render_the_envelope() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("/api/nope"));
}

#[tokio::test]
async fn malformed_json_renders_the_envelope() {
    let app = TestApp::new();

    use tower::ServiceExt;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}
