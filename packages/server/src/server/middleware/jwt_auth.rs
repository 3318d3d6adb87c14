use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::{middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domains::auth::models::Role;
use crate::domains::auth::{JwtService, TokenError};
use crate::server::error::ApiError;

/// Authenticated user information decoded from the session token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub mobile_number: String,
    pub role: Role,
}

/// Present when a token was supplied but failed verification; lets the
/// extractor answer "expired" vs "invalid" distinctly.
#[derive(Clone, Debug)]
struct TokenRejection(TokenError);

/// JWT authentication middleware
///
/// Extracts the token from the Authorization header, verifies it, and adds
/// AuthUser to request extensions. Requests without a valid token continue -
/// route-level extractors decide whether authentication is required.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(request.headers()) {
        match jwt_service.verify_token(&token) {
            Ok(claims) => {
                let user = AuthUser {
                    user_id: claims.user_id,
                    email: claims.email,
                    mobile_number: claims.mobile_number,
                    role: claims.role,
                };
                debug!(user_id = %user.user_id, role = %user.role.as_str(), "Authenticated");
                request.extensions_mut().insert(user);
            }
            Err(e) => {
                debug!(reason = %e, "Token rejected");
                request.extensions_mut().insert(TokenRejection(e));
            }
        }
    }

    next.run(request).await
}

/// Pull the bearer token out of the Authorization header.
/// Accepts both "Bearer <token>" and a raw token.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        if let Some(TokenRejection(e)) = parts.extensions.get::<TokenRejection>() {
            return Err(ApiError::Auth(e.to_string()));
        }
        Err(ApiError::Auth("Access token is required".to_string()))
    }
}

/// Extractor for admin/official-only routes. The capability check happens
/// here, once, at the access-control boundary.
#[derive(Clone, Debug)]
pub struct Staff(pub AuthUser);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Staff {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.can_manage_issues() {
            return Err(ApiError::Forbidden(
                "Access denied. Admin privileges required.".to_string(),
            ));
        }
        Ok(Staff(user))
    }
}
