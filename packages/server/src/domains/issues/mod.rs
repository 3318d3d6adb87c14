//! Issues domain: citizen-submitted civic issues and their triage lifecycle.

pub mod models;

pub use models::*;
