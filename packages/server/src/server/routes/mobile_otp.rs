//! Mobile-channel OTP flow: login and registration verification.

use axum::extract::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::common::validation::validate_otp_shape;
use crate::domains::auth::actions::{issue_challenge, verify_challenge, OtpIssueError};
use crate::domains::auth::mobile_number::validate_mobile_number;
use crate::domains::auth::models::{OtpPurpose, UserProfile};
use crate::domains::auth::Channel;
use crate::kernel::{ServerDeps, UserStore};
use crate::server::error::{ApiError, ValidJson};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMobileOtpRequest {
    #[serde(default)]
    pub mobile_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyMobileOtpRequest {
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(Serialize)]
struct SentData {
    #[serde(rename = "mobileNumber")]
    mobile_number: String,
    #[serde(rename = "expiresIn")]
    expires_in: &'static str,
}

#[derive(Serialize)]
pub struct SentResponse {
    success: bool,
    message: String,
    data: SentData,
}

fn map_issue_error(e: OtpIssueError) -> ApiError {
    match e {
        OtpIssueError::AccountNotFound => ApiError::NotFound(
            "No account found with this mobile number. Please register first.".to_string(),
        ),
        OtpIssueError::AccountExists => ApiError::Conflict(
            "Account already exists with this mobile number. Please login instead.".to_string(),
        ),
        OtpIssueError::DeliveryFailed(_) => {
            ApiError::Delivery("Failed to send OTP. Please try again.".to_string())
        }
        OtpIssueError::Store(e) => e.into(),
    }
}

/// POST /api/mobile-otp/send-login-otp
pub async fn send_login_otp(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<SendMobileOtpRequest>,
) -> Result<Json<SentResponse>, ApiError> {
    let mobile = validate_mobile_number(&body.mobile_number)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let issued = issue_challenge(Channel::Mobile(&mobile.formatted), OtpPurpose::Login, &deps)
        .await
        .map_err(map_issue_error)?;

    Ok(Json(SentResponse {
        success: true,
        message: format!("OTP sent successfully to {}", issued.channel),
        data: SentData {
            mobile_number: issued.channel,
            expires_in: issued.expires_in,
        },
    }))
}

#[derive(Serialize)]
struct LoginData {
    token: String,
    user: UserProfile,
    #[serde(rename = "expiresIn")]
    expires_in: &'static str,
}

#[derive(Serialize)]
pub struct LoginResponse {
    success: bool,
    message: String,
    data: LoginData,
}

/// POST /api/mobile-otp/verify-login-otp
pub async fn verify_login_otp(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<VerifyMobileOtpRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mobile = validate_mobile_number(&body.mobile_number)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    validate_otp_shape(&body.otp)?;

    verify_challenge(
        Channel::Mobile(&mobile.formatted),
        &body.otp,
        OtpPurpose::Login,
        &deps,
    )
    .await?;

    let user = deps
        .users
        .find_by_mobile(&mobile.formatted)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.mobile_verified {
        deps.users.mark_mobile_verified(user.id).await?;
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
        message: "Login successful".to_string(),
        data: LoginData {
            token,
            user: user.profile(),
            expires_in: "7 days",
        },
    }))
}

/// POST /api/mobile-otp/send-registration-otp
pub async fn send_registration_otp(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<SendMobileOtpRequest>,
) -> Result<Json<SentResponse>, ApiError> {
    let mobile = validate_mobile_number(&body.mobile_number)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let issued = issue_challenge(
        Channel::Mobile(&mobile.formatted),
        OtpPurpose::Registration,
        &deps,
    )
    .await
    .map_err(map_issue_error)?;

    Ok(Json(SentResponse {
        success: true,
        message: format!("Verification OTP sent successfully to {}", issued.channel),
        data: SentData {
            mobile_number: issued.channel,
            expires_in: issued.expires_in,
        },
    }))
}

#[derive(Serialize)]
struct VerifiedData {
    #[serde(rename = "mobileNumber")]
    mobile_number: String,
    verified: bool,
}

#[derive(Serialize)]
pub struct VerifiedResponse {
    success: bool,
    message: String,
    data: VerifiedData,
}

/// POST /api/mobile-otp/verify-registration-otp
pub async fn verify_registration_otp(
    Extension(deps): Extension<Arc<ServerDeps>>,
    ValidJson(body): ValidJson<VerifyMobileOtpRequest>,
) -> Result<Json<VerifiedResponse>, ApiError> {
    let mobile = validate_mobile_number(&body.mobile_number)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    validate_otp_shape(&body.otp)?;

    verify_challenge(
        Channel::Mobile(&mobile.formatted),
        &body.otp,
        OtpPurpose::Registration,
        &deps,
    )
    .await?;

    Ok(Json(VerifiedResponse {
        success: true,
        message: "Mobile number verified successfully. You can now complete your registration."
            .to_string(),
        data: VerifiedData {
            mobile_number: mobile.formatted,
            verified: true,
        },
    }))
}
