//! Mobile number validation and formatting.
//!
//! Accepts 10-digit Indian mobile numbers (first digit 6-9) in any common
//! spelling: bare digits, `91`-prefixed, `+91`-prefixed, with or without
//! whitespace or punctuation. Canonical form is `+91` followed by the ten
//! digits. Pure functions, no side effects.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref MOBILE_RE: Regex = Regex::new(r"^[6-9]\d{9}$").unwrap();
}

pub const COUNTRY_CODE: &str = "+91";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MobileNumberError {
    #[error("Mobile number is required")]
    Missing,
    #[error("Mobile number must be 10 digits")]
    WrongLength,
    #[error("Mobile number must start with 6, 7, 8 or 9")]
    BadLeadingDigit,
}

/// A validated mobile number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMobile {
    /// Canonical `+91XXXXXXXXXX` form used as the store key.
    pub formatted: String,
    /// The bare ten digits.
    pub digits: String,
}

/// Validate and canonicalize a raw mobile number.
///
/// Idempotent: validating an already-formatted number yields the same
/// formatted value.
pub fn validate_mobile_number(raw: &str) -> Result<ValidMobile, MobileNumberError> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err(MobileNumberError::Missing);
    }

    // Strip a leading country code so "+91 98765 43210" round-trips.
    if digits.len() == 12 && digits.starts_with("91") {
        digits = digits[2..].to_string();
    }

    if digits.len() != 10 {
        return Err(MobileNumberError::WrongLength);
    }
    if !MOBILE_RE.is_match(&digits) {
        return Err(MobileNumberError::BadLeadingDigit);
    }

    Ok(ValidMobile {
        formatted: format!("{}{}", COUNTRY_CODE, digits),
        digits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bare_ten_digits() {
        let v = validate_mobile_number("9876543210").unwrap();
        assert_eq!(v.formatted, "+919876543210");
        assert_eq!(v.digits, "9876543210");
    }

    #[test]
    fn strips_whitespace_and_punctuation() {
        let v = validate_mobile_number(" 98765 43210 ").unwrap();
        assert_eq!(v.formatted, "+919876543210");
        let v = validate_mobile_number("98765-43210").unwrap();
        assert_eq!(v.formatted, "+919876543210");
    }

    #[test]
    fn accepts_country_code_prefix() {
        assert_eq!(
            validate_mobile_number("919876543210").unwrap().formatted,
            "+919876543210"
        );
        assert_eq!(
            validate_mobile_number("+919876543210").unwrap().formatted,
            "+919876543210"
        );
    }

    #[test]
    fn is_idempotent_on_formatted_output() {
        let first = validate_mobile_number("6000000001").unwrap();
        let second = validate_mobile_number(&first.formatted).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn all_valid_leading_digits() {
        for lead in ['6', '7', '8', '9'] {
            let raw = format!("{}123456789", lead);
            assert!(validate_mobile_number(&raw).is_ok(), "lead {}", lead);
        }
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            validate_mobile_number(""),
            Err(MobileNumberError::Missing)
        );
        assert_eq!(
            validate_mobile_number("abc"),
            Err(MobileNumberError::Missing)
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            validate_mobile_number("98765"),
            Err(MobileNumberError::WrongLength)
        );
        assert_eq!(
            validate_mobile_number("98765432101"),
            Err(MobileNumberError::WrongLength)
        );
    }

    #[test]
    fn rejects_bad_leading_digit() {
        for lead in ['0', '1', '2', '3', '4', '5'] {
            let raw = format!("{}123456789", lead);
            assert_eq!(
                validate_mobile_number(&raw),
                Err(MobileNumberError::BadLeadingDigit),
                "lead {}",
                lead
            );
        }
    }
}
