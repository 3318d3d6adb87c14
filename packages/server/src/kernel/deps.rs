//! Shared server dependencies.
//!
//! Constructed once at startup and injected into handlers; tests build their
//! own with fresh in-memory stores and a capturing delivery transport.

use std::sync::Arc;

use super::store::{IssueStore, OtpStore, StorageBackend, Stores, UserStore};
use super::traits::OtpDelivery;
use crate::domains::auth::JwtService;

#[derive(Clone)]
pub struct ServerDeps {
    pub users: Arc<dyn UserStore>,
    pub otps: Arc<dyn OtpStore>,
    pub issues: Arc<dyn IssueStore>,
    pub delivery: Arc<dyn OtpDelivery>,
    pub jwt_service: Arc<JwtService>,
    pub storage_backend: StorageBackend,
}

impl ServerDeps {
    pub fn new(
        stores: Stores,
        delivery: Arc<dyn OtpDelivery>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            users: stores.users,
            otps: stores.otps,
            issues: stores.issues,
            delivery,
            jwt_service,
            storage_backend: stores.backend,
        }
    }
}
