//! OTP issuance.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domains::auth::models::{OtpChallenge, OtpPurpose};
use crate::domains::auth::Channel;
use crate::kernel::{OtpStore, ServerDeps, StoreError, UserStore};

/// Fixed human-readable expiry window reported to callers. The raw code is
/// never part of the result - it is only dispatched and logged.
pub const EXPIRES_IN: &str = "10 minutes";

#[derive(Debug, Error)]
pub enum OtpIssueError {
    /// Login (and only login) requires a registered identity on the channel.
    #[error("No account found for this channel")]
    AccountNotFound,
    /// Registration requires the channel to be unclaimed.
    #[error("An account already exists for this channel")]
    AccountExists,
    /// The delivery transport rejected the dispatch. Any challenge row left
    /// behind is superseded by the next issuance.
    #[error("Failed to dispatch OTP")]
    DeliveryFailed(#[source] anyhow::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful issuance.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub channel: String,
    pub expires_in: &'static str,
}

/// Issue a one-time password for a channel and purpose.
///
/// The channel identifier must already be validated and canonicalized.
/// Creating the new challenge first deletes any predecessor for the same
/// (channel, purpose), so at most one is ever active.
pub async fn issue_challenge(
    channel: Channel<'_>,
    purpose: OtpPurpose,
    deps: &ServerDeps,
) -> Result<IssuedChallenge, OtpIssueError> {
    let key = channel.key();

    // Purpose-specific preconditions against the identity store.
    let existing = match channel {
        Channel::Email(email) => deps.users.find_by_email(email).await?,
        Channel::Mobile(mobile) => deps.users.find_by_mobile(mobile).await?,
    };
    match purpose {
        OtpPurpose::Login if existing.is_none() => return Err(OtpIssueError::AccountNotFound),
        OtpPurpose::Registration if existing.is_some() => {
            return Err(OtpIssueError::AccountExists)
        }
        _ => {}
    }

    // Supersede any outstanding challenge, then persist the new one.
    deps.otps.delete_for(key, purpose).await?;

    let code = OtpChallenge::generate_code();
    let challenge = OtpChallenge::new(key, purpose, code.clone(), Utc::now());
    deps.otps.insert(&challenge).await?;

    debug!(channel = %key, purpose = %purpose.as_str(), code = %code, "OTP generated");

    deps.delivery
        .send_otp(key, &code, purpose.as_str())
        .await
        .map_err(OtpIssueError::DeliveryFailed)?;

    info!(channel = %key, purpose = %purpose.as_str(), "OTP sent");

    Ok(IssuedChallenge {
        channel: key.to_string(),
        expires_in: EXPIRES_IN,
    })
}
