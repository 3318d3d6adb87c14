//! Request body validation for the auth surface.
//!
//! Mirrors the validation rules the frontend relies on: name shape, email
//! shape, password strength. Mobile numbers have their own validator in
//! `domains::auth::mobile_number`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    static ref FULL_NAME_RE: Regex = Regex::new(r"^[A-Za-z ]+$").unwrap();
}

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

/// Check an email address shape. Returns the normalized (lowercased) form.
pub fn validate_email(email: &str) -> Result<String, FieldError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(FieldError::new(
            "email",
            "Please provide a valid email address",
        ));
    }
    Ok(email)
}

/// Check full name: 2-100 characters, letters and spaces only.
pub fn validate_full_name(name: &str) -> Result<String, FieldError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FieldError::new("fullName", "Full name is required"));
    }
    if name.len() < 2 || name.len() > 100 {
        return Err(FieldError::new(
            "fullName",
            "Full name must be between 2 and 100 characters",
        ));
    }
    if !FULL_NAME_RE.is_match(name) {
        return Err(FieldError::new(
            "fullName",
            "Full name can only contain letters and spaces",
        ));
    }
    Ok(name.to_string())
}

/// Password policy: at least 6 characters with one lowercase letter, one
/// uppercase letter and one digit.
pub fn validate_password(password: &str) -> Result<(), FieldError> {
    if password.len() < 6 {
        return Err(FieldError::new(
            "password",
            "Password must be at least 6 characters long",
        ));
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(FieldError::new(
            "password",
            "Password must contain at least one lowercase letter, one uppercase letter, and one number",
        ));
    }
    Ok(())
}

/// An OTP input must be exactly 6 ASCII digits.
pub fn validate_otp_shape(otp: &str) -> Result<(), FieldError> {
    if otp.len() != 6 || !otp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::new("otp", "OTP must be 6 digits"));
    }
    Ok(())
}
