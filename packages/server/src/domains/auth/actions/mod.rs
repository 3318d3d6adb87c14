//! Auth domain actions - business logic functions
//!
//! Route handlers call these and map the typed errors onto HTTP responses.

mod send_otp;
mod verify_otp;

pub use send_otp::{issue_challenge, IssuedChallenge, OtpIssueError};
pub use verify_otp::{verify_challenge, OtpVerifyError};
