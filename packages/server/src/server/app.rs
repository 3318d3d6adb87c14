//! Application setup and router composition.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode, Uri,
    },
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::{jwt_auth_middleware, rate_limit_middleware, RateLimiter};
use crate::server::routes::{auth, health_handler, issues, mobile_otp, otp};

/// Window for the public auth/OTP surface.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);
/// Register/login attempts per window per address.
const AUTH_RATE_LIMIT: u32 = 5;
/// Email-OTP requests per window per address.
const OTP_RATE_LIMIT: u32 = 3;

/// Build the CORS layer for the configured frontend origin.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin).allow_credentials(true),
        Err(_) => {
            tracing::warn!(
                origin = %allowed_origin,
                "Invalid FRONTEND_URL, allowing any origin without credentials"
            );
            layer.allow_origin(tower_http::cors::Any)
        }
    }
}

/// Unmatched routes render the standard envelope instead of a bare 404.
async fn fallback_handler(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("Route {} not found", uri.path()),
            "method": method.as_str(),
        })),
    )
}

/// Build the Axum application router.
pub fn build_app(deps: Arc<ServerDeps>, allowed_origin: &str) -> Router {
    let auth_limiter = RateLimiter::new(RATE_LIMIT_WINDOW, AUTH_RATE_LIMIT);
    let otp_limiter = RateLimiter::new(RATE_LIMIT_WINDOW, OTP_RATE_LIMIT);

    // Public credential routes, rate-limited.
    let auth_public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(middleware::from_fn(
            move |connect_info: Option<ConnectInfo<SocketAddr>>,
                  request: axum::extract::Request,
                  next: axum::middleware::Next| {
                rate_limit_middleware(auth_limiter.clone(), connect_info, request, next)
            },
        ));

    // Token-guarded account routes.
    let auth_private = Router::new()
        .route("/profile", get(auth::profile))
        .route("/logout", post(auth::logout))
        .route("/verify-token", get(auth::verify_token));

    // Email-channel OTP flow, tighter rate limit.
    let otp_routes = Router::new()
        .route("/send-login-otp", post(otp::send_login_otp))
        .route("/verify-login-otp", post(otp::verify_login_otp))
        .route("/resend", post(otp::resend_otp))
        .layer(middleware::from_fn(
            move |connect_info: Option<ConnectInfo<SocketAddr>>,
                  request: axum::extract::Request,
                  next: axum::middleware::Next| {
                rate_limit_middleware(otp_limiter.clone(), connect_info, request, next)
            },
        ));

    // Mobile-channel OTP flow.
    let mobile_otp_routes = Router::new()
        .route("/send-login-otp", post(mobile_otp::send_login_otp))
        .route("/verify-login-otp", post(mobile_otp::verify_login_otp))
        .route(
            "/send-registration-otp",
            post(mobile_otp::send_registration_otp),
        )
        .route(
            "/verify-registration-otp",
            post(mobile_otp::verify_registration_otp),
        );

    // Issue reporting and triage.
    let issue_routes = Router::new()
        .route("/", post(issues::create_issue).get(issues::list_issues))
        .route("/my-issues", get(issues::my_issues))
        .route("/admin/statistics", get(issues::statistics))
        .route("/:id", get(issues::get_issue).delete(issues::delete_issue))
        .route("/:id/status", put(issues::update_issue_status))
        .route("/:id/assign", put(issues::assign_issue));

    let jwt_service = deps.jwt_service.clone();

    Router::new()
        .nest("/api/auth", auth_public.merge(auth_private))
        .nest("/api/otp", otp_routes)
        .nest("/api/mobile-otp", mobile_otp_routes)
        .nest("/api/issues", issue_routes)
        .route("/api/health", get(health_handler))
        .fallback(fallback_handler)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |request, next| {
            jwt_auth_middleware(jwt_service.clone(), request, next)
        }))
        .layer(Extension(deps))
        .layer(cors_layer(allowed_origin))
        .layer(TraceLayer::new_for_http())
}
