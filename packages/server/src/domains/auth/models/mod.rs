pub mod otp;
pub mod user;

pub use otp::{OtpChallenge, OtpPurpose, VerifyOutcome, MAX_ATTEMPTS};
pub use user::{NewUser, Role, User, UserProfile};
