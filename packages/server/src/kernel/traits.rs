// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Business rules
// (like the OTP state machine) live in domain functions that use these.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;

use smsgate::SmsGateService;

// =============================================================================
// OTP delivery transport
// =============================================================================

/// Dispatches a one-time password to a channel (mobile number or email).
///
/// The production implementation is the demo gateway; tests substitute
/// their own.
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    async fn send_otp(&self, recipient: &str, code: &str, purpose: &str) -> Result<()>;
}

/// Adapter wrapping the SMS gateway behind the delivery trait.
pub struct SmsGateAdapter {
    gateway: Arc<SmsGateService>,
}

impl SmsGateAdapter {
    pub fn new(gateway: Arc<SmsGateService>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl OtpDelivery for SmsGateAdapter {
    async fn send_otp(&self, recipient: &str, code: &str, purpose: &str) -> Result<()> {
        self.gateway
            .send_otp(recipient, code, purpose)
            .await
            .map(|_receipt| ())
            .map_err(|e| anyhow!("Delivery transport error: {}", e))
    }
}
