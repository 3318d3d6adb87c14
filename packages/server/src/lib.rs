// Civic Connect - API Core
//
// Backend API for the civic issue-reporting platform: citizens submit issues,
// officials triage and resolve them. Authentication is credential- or
// OTP-based (email and mobile channels) with JWT sessions.
//
// Persistence sits behind repository traits in kernel/store with two
// backends: Postgres (sqlx) and an in-process fallback used when the
// database is unreachable, so the dev/demo flow keeps working.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
