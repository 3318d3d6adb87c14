//! Credential-based auth: register, login, profile, logout, token echo.

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::common::validation::{
    validate_email, validate_full_name, validate_password, FieldError,
};
use crate::domains::auth::mobile_number::validate_mobile_number;
use crate::domains::auth::models::{NewUser, Role, UserProfile};
use crate::domains::auth::password;
use crate::kernel::{ServerDeps, UserStore};
use crate::server::error::{ApiError, ValidJson};
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub mobile_number: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
struct AuthData {
    user: UserProfile,
    token: String,
    #[serde(rename = "tokenType")]
    token_type: &'static str,
}

#[derive(Serialize)]
pub struct AuthResponse {
    success: bool,
    message: String,
    data: AuthData,
}

/// POST /api/auth/register
pub async fn register(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    // Collect every field failure so the client can render them together.
    let mut errors: Vec<FieldError> = Vec::new();

    let full_name = match validate_full_name(&body.full_name) {
        Ok(name) => Some(name),
        Err(e) => {
            errors.push(e);
            None
        }
    };
    let email = match validate_email(&body.email) {
        Ok(email) => Some(email),
        Err(e) => {
            errors.push(e);
            None
        }
    };
    if let Err(e) = validate_password(&body.password) {
        errors.push(e);
    }
    if body.password != body.confirm_password {
        errors.push(FieldError::new(
            "confirmPassword",
            "Password confirmation does not match password",
        ));
    }
    let mobile = match validate_mobile_number(&body.mobile_number) {
        Ok(m) => Some(m),
        Err(e) => {
            errors.push(FieldError::new("mobileNumber", e.to_string()));
            None
        }
    };

    if !errors.is_empty() {
        return Err(ApiError::ValidationDetailed(errors));
    }
    let (full_name, email, mobile) = (full_name.unwrap(), email.unwrap(), mobile.unwrap());

    // Uniqueness checks; the store's unique constraints back these up.
    if deps.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }
    if deps.users.find_by_mobile(&mobile.formatted).await?.is_some() {
        return Err(ApiError::Conflict(
            "User with this mobile number already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&body.password)?;

    let user = deps
        .users
        .insert(NewUser {
            full_name,
            email,
            mobile_number: mobile.formatted,
            password_hash,
            role: Role::Citizen,
        })
        .await?;

    let token = deps.jwt_service.create_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully".to_string(),
            data: AuthData {
                user: user.profile(),
                token,
                token_type: "Bearer",
            },
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = validate_email(&body.email)?;

    let invalid = || ApiError::Auth("Invalid email or password".to_string());

    let user = deps.users.find_by_email(&email).await?.ok_or_else(invalid)?;

    // A malformed stored hash compares as a mismatch, same as the unknown-
    // user path, so the two are indistinguishable to the caller.
    let credential_ok =
        password::verify_password(&body.password, &user.password_hash).unwrap_or(false);
    if !credential_ok {
        return Err(invalid());
    }

    deps.users.touch_last_login(user.id).await?;
    let token = deps.jwt_service.create_token(&user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        data: AuthData {
            user: user.profile(),
            token,
            token_type: "Bearer",
        },
    }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    success: bool,
    data: ProfileData,
}

#[derive(Serialize)]
struct ProfileData {
    user: UserProfile,
}

/// GET /api/auth/profile
pub async fn profile(
    Extension(deps): Extension<Arc<ServerDeps>>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = deps
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        data: ProfileData {
            user: user.profile(),
        },
    }))
}

#[derive(Serialize)]
pub struct MessageResponse {
    success: bool,
    message: String,
}

/// POST /api/auth/logout
///
/// Stateless: the client discards its token. Kept for API symmetry.
pub async fn logout(_auth: AuthUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: "Logout successful".to_string(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimsEcho {
    user_id: uuid::Uuid,
    email: String,
    mobile_number: String,
    role: Role,
}

#[derive(Serialize)]
pub struct VerifyTokenResponse {
    success: bool,
    message: String,
    data: ClaimsEcho,
}

/// GET /api/auth/verify-token
pub async fn verify_token(auth: AuthUser) -> Json<VerifyTokenResponse> {
    Json(VerifyTokenResponse {
        success: true,
        message: "Token is valid".to_string(),
        data: ClaimsEcho {
            user_id: auth.user_id,
            email: auth.email,
            mobile_number: auth.mobile_number,
            role: auth.role,
        },
    })
}
