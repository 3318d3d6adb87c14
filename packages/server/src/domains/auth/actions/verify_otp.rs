//! OTP verification.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::domains::auth::models::{OtpPurpose, VerifyOutcome};
use crate::domains::auth::Channel;
use crate::kernel::{OtpStore, ServerDeps, StoreError};

#[derive(Debug, Error)]
pub enum OtpVerifyError {
    #[error("OTP not found or already verified")]
    ChallengeNotFound,
    #[error("OTP has expired. Please request a new one.")]
    Expired,
    #[error("Too many failed attempts. Please request a new OTP.")]
    AttemptsExhausted,
    #[error("Invalid OTP. {remaining} attempts remaining.")]
    Mismatch { remaining: i32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Verify a submitted code against the active challenge for
/// (channel, purpose).
///
/// The pure state machine on the model decides the transition; this applies
/// the matching store effect. Expired and exhausted challenges are deleted;
/// a verified challenge is retained with verified = true, so replaying the
/// same code reports not-found rather than verifying twice.
pub async fn verify_challenge(
    channel: Channel<'_>,
    code: &str,
    purpose: OtpPurpose,
    deps: &ServerDeps,
) -> Result<(), OtpVerifyError> {
    let key = channel.key();

    let Some(challenge) = deps.otps.find_unverified(key, purpose).await? else {
        return Err(OtpVerifyError::ChallengeNotFound);
    };

    match challenge.evaluate(code, Utc::now()) {
        VerifyOutcome::Verified => {
            deps.otps.mark_verified(challenge.id).await?;
            info!(channel = %key, purpose = %purpose.as_str(), "OTP verified");
            Ok(())
        }
        VerifyOutcome::Expired => {
            deps.otps.delete(challenge.id).await?;
            Err(OtpVerifyError::Expired)
        }
        VerifyOutcome::AttemptsExhausted => {
            deps.otps.delete(challenge.id).await?;
            Err(OtpVerifyError::AttemptsExhausted)
        }
        VerifyOutcome::Mismatch { remaining } => {
            deps.otps.increment_attempts(challenge.id).await?;
            Err(OtpVerifyError::Mismatch { remaining })
        }
    }
}
