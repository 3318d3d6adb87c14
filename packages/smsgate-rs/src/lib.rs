// Demo SMS/email gateway for one-time passwords.
//
// This repo does not talk to a real provider (Twilio/AWS SNS/MSG91 would slot
// in here). The gateway renders the message and emits it on the `sms.outbound`
// tracing target so the dev flow works without credentials.

pub mod models;

use crate::models::DeliveryReceipt;

#[derive(Debug, Clone)]
pub struct SmsGateOptions {
    /// Sender name stamped into the message footer.
    pub sender_id: String,
}

impl Default for SmsGateOptions {
    fn default() -> Self {
        Self {
            sender_id: "Civic Connect".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmsGateService {
    options: SmsGateOptions,
}

impl SmsGateService {
    pub fn new(options: SmsGateOptions) -> Self {
        Self { options }
    }

    /// Deliver a one-time password to a phone number or email address.
    ///
    /// Channel is inferred from the recipient format, matching how verify
    /// providers accept a single `To` field for both.
    pub async fn send_otp(
        &self,
        recipient: &str,
        code: &str,
        purpose: &str,
    ) -> Result<DeliveryReceipt, &'static str> {
        if recipient.is_empty() {
            return Err("Recipient is required");
        }
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err("OTP code must be 6 digits");
        }

        let channel = if recipient.contains('@') {
            "email"
        } else {
            "sms"
        };

        let body = self.render_otp_message(code, purpose);
        self.dispatch(recipient, channel, &body)
    }

    /// Deliver a free-form message (demo transport).
    pub async fn send_message(
        &self,
        recipient: &str,
        body: &str,
    ) -> Result<DeliveryReceipt, &'static str> {
        if recipient.is_empty() {
            return Err("Recipient is required");
        }
        let channel = if recipient.contains('@') {
            "email"
        } else {
            "sms"
        };
        self.dispatch(recipient, channel, body)
    }

    fn dispatch(
        &self,
        recipient: &str,
        channel: &str,
        body: &str,
    ) -> Result<DeliveryReceipt, &'static str> {
        let message_id = format!("SMS_{}", uuid::Uuid::new_v4().simple());

        tracing::info!(
            target: "sms.outbound",
            to = %recipient,
            channel = %channel,
            message_id = %message_id,
            body = %body,
            "outbound message"
        );

        Ok(DeliveryReceipt {
            message_id,
            to: recipient.to_string(),
            channel: channel.to_string(),
            status: "queued".to_string(),
        })
    }

    fn render_otp_message(&self, code: &str, purpose: &str) -> String {
        let purpose_text = if purpose == "login" {
            "login"
        } else {
            "verification"
        };
        format!(
            "{}: Your OTP for {} is {}. Valid for 10 minutes. Do not share with anyone.",
            self.options.sender_id, purpose_text, code
        )
    }
}
