//! Email-channel OTP flow: send, verify, resend.

use axum::extract::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::common::validation::{validate_email, validate_otp_shape};
use crate::domains::auth::actions::{issue_challenge, verify_challenge, OtpIssueError};
use crate::domains::auth::models::{OtpPurpose, UserProfile};
use crate::domains::auth::Channel;
use crate::kernel::{ServerDeps, UserStore};
use crate::server::error::{ApiError, ValidJson};

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    #[serde(default)]
    pub email: String,
    pub purpose: Option<String>,
}

#[derive(Serialize)]
struct SentData {
    email: String,
    #[serde(rename = "expiresIn")]
    expires_in: &'static str,
}

#[derive(Serialize)]
pub struct SentResponse {
    success: bool,
    message: String,
    data: SentData,
}

fn map_issue_error(e: OtpIssueError, not_found_message: &str) -> ApiError {
    match e {
        OtpIssueError::AccountNotFound => ApiError::NotFound(not_found_message.to_string()),
        OtpIssueError::AccountExists => ApiError::Conflict(
            "Account already exists with this email address. Please login instead.".to_string(),
        ),
        OtpIssueError::DeliveryFailed(_) => {
            ApiError::Delivery("Failed to send OTP. Please try again.".to_string())
        }
        OtpIssueError::Store(e) => e.into(),
    }
}

/// POST /api/otp/send-login-otp
pub async fn send_login_otp(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<SendOtpRequest>,
) -> Result<Json<SentResponse>, ApiError> {
    let email = validate_email(&body.email)?;

    let issued = issue_challenge(Channel::Email(&email), OtpPurpose::Login, &deps)
        .await
        .map_err(|e| {
            map_issue_error(
                e,
                "No account found with this email address. Please sign up first.",
            )
        })?;

    Ok(Json(SentResponse {
        success: true,
        message: "OTP sent successfully to your email address".to_string(),
        data: SentData {
            email: issued.channel,
            expires_in: issued.expires_in,
        },
    }))
}

#[derive(Serialize)]
struct LoginData {
    user: UserProfile,
    token: String,
    #[serde(rename = "tokenType")]
    token_type: &'static str,
}

#[derive(Serialize)]
pub struct LoginResponse {
    success: bool,
    message: String,
    data: LoginData,
}

/// POST /api/otp/verify-login-otp
pub async fn verify_login_otp(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<VerifyOtpRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = validate_email(&body.email)?;
    validate_otp_shape(&body.otp)?;

    verify_challenge(Channel::Email(&email), &body.otp, OtpPurpose::Login, &deps).await?;

    let user = deps
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // The verification service owns the flag flip for the channel it proved.
    if !user.email_verified {
        deps.users.mark_email_verified(user.id).await?;
    }
    deps.users.touch_last_login(user.id).await?;

    let user = deps
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let token = deps.jwt_service.create_token(&user)?;

    Ok(Json(LoginResponse {
        success: true,
        message: "OTP verified successfully. Login successful!".to_string(),
        data: LoginData {
            user: user.profile(),
            token,
            token_type: "Bearer",
        },
    }))
}

/// POST /api/otp/resend
pub async fn resend_otp(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<ResendOtpRequest>,
) -> Result<Json<SentResponse>, ApiError> {
    let email = validate_email(&body.email)?;

    let purpose = match body.purpose.as_deref() {
        None => OtpPurpose::Login,
        Some(raw) => OtpPurpose::parse(raw)
            .ok_or_else(|| ApiError::Validation("Invalid purpose specified".to_string()))?,
    };

    let issued = issue_challenge(Channel::Email(&email), purpose, &deps)
        .await
        .map_err(|e| map_issue_error(e, "No account found with this email address"))?;

    Ok(Json(SentResponse {
        success: true,
        message: "New OTP sent successfully".to_string(),
        data: SentData {
            email: issued.channel,
            expires_in: issued.expires_in,
        },
    }))
}
