//! Test harness: the real router wired to a fresh in-memory store.
//!
//! Each test constructs its own `TestApp`, so stores and rate-limiter
//! windows are fully isolated. OTP codes are captured through the store
//! (the same hook the dev fallback flow uses) since the API never returns
//! them.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use server_core::domains::auth::models::{NewUser, OtpPurpose, Role, User};
use server_core::domains::auth::JwtService;
use server_core::kernel::{MemoryStore, OtpStore, ServerDeps, SmsGateAdapter, Stores, UserStore};
use server_core::server::build_app;
use smsgate::{SmsGateOptions, SmsGateService};

pub const TEST_ORIGIN: &str = "http://localhost:3000";

pub struct TestApp {
    pub router: Router,
    pub deps: Arc<ServerDeps>,
}

#[allow(dead_code)]
impl TestApp {
    /// App over an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// App over a store seeded with the demo identities.
    pub fn seeded() -> Self {
        Self::with_store(Arc::new(MemoryStore::seeded()))
    }

    fn with_store(store: Arc<MemoryStore>) -> Self {
        let gateway = Arc::new(SmsGateService::new(SmsGateOptions::default()));
        let delivery = Arc::new(SmsGateAdapter::new(gateway));
        let jwt_service = Arc::new(JwtService::new("test_secret_key", "test_issuer".to_string()));

        let deps = Arc::new(ServerDeps::new(
            Stores::memory(store),
            delivery,
            jwt_service,
        ));
        let router = build_app(deps.clone(), TEST_ORIGIN);

        Self { router, deps }
    }

    /// Drive one request through the router and decode the JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is JSON")
        };
        (status, json)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, token, None).await
    }

    /// Store hook: read the active challenge's code for a channel.
    pub async fn peek_otp(&self, channel: &str, purpose: OtpPurpose) -> Option<String> {
        self.deps
            .otps
            .find_unverified(channel, purpose)
            .await
            .expect("store read")
            .map(|challenge| challenge.code)
    }

    /// Insert a user directly into the store (bypasses the API).
    pub async fn create_user(&self, email: &str, mobile: &str, role: Role) -> User {
        self.deps
            .users
            .insert(NewUser {
                full_name: "Fixture User".to_string(),
                email: email.to_string(),
                mobile_number: mobile.to_string(),
                // bcrypt cost 4 keeps fixture setup fast.
                password_hash: bcrypt::hash("Password1", 4).expect("hash"),
                role,
            })
            .await
            .expect("user inserts")
    }

    /// Mint a session token for a fixture user.
    pub fn token_for(&self, user: &User) -> String {
        self.deps.jwt_service.create_token(user).expect("token mints")
    }
}

/// A 6-digit code guaranteed to differ from `code`.
#[allow(dead_code)]
pub fn wrong_code(code: &str) -> String {
    if code == "000000" {
        "111111".to_string()
    } else {
        "000000".to_string()
    }
}
