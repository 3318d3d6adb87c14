// HTTP routes
pub mod auth;
pub mod health;
pub mod issues;
pub mod mobile_otp;
pub mod otp;

pub use health::*;
