//! Auth domain: users, credentials, OTP challenges and JWT sessions.

pub mod actions;
pub mod jwt;
pub mod mobile_number;
pub mod models;
pub mod password;

pub use jwt::{Claims, JwtService, TokenError};

/// The destination an OTP challenge is addressed to.
///
/// Callers validate/normalize the identifier before constructing a `Channel`:
/// emails are lowercased, mobile numbers are in the `+91` canonical form.
#[derive(Debug, Clone, Copy)]
pub enum Channel<'a> {
    Email(&'a str),
    Mobile(&'a str),
}

impl Channel<'_> {
    /// The string the challenge is keyed by in the store.
    pub fn key(&self) -> &str {
        match self {
            Channel::Email(s) | Channel::Mobile(s) => s,
        }
    }
}
