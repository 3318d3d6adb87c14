//! One-time-password challenges.
//!
//! A challenge is an ephemeral record keyed by (channel, purpose). At most
//! one unverified challenge exists per key: issuing a new one deletes its
//! predecessor. Verification is a small state machine with a fixed check
//! order - expiry before attempt limit before code equality - so an expired
//! and over-limit challenge reports "expired".

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A challenge dies after this many failed attempts.
pub const MAX_ATTEMPTS: i32 = 5;

/// Challenges expire 10 minutes after issuance.
pub fn validity_window() -> Duration {
    Duration::minutes(10)
}

/// What a challenge was issued for. Scopes uniqueness and business rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "otp_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    Registration,
    PasswordReset,
}

impl OtpPurpose {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "login" => Some(OtpPurpose::Login),
            "registration" => Some(OtpPurpose::Registration),
            "password_reset" => Some(OtpPurpose::PasswordReset),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::Registration => "registration",
            OtpPurpose::PasswordReset => "password_reset",
        }
    }
}

/// Result of evaluating a verification attempt against a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched; persist verified = true.
    Verified,
    /// Past expiry; delete the record.
    Expired,
    /// Attempt limit already reached; delete the record.
    AttemptsExhausted,
    /// Wrong code; increment attempts and keep the record.
    Mismatch { remaining: i32 },
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpChallenge {
    pub id: Uuid,
    pub channel: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub verified: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Build a fresh challenge for a channel.
    pub fn new(channel: &str, purpose: OtpPurpose, code: String, now: DateTime<Utc>) -> Self {
        OtpChallenge {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            code,
            purpose,
            verified: false,
            attempts: 0,
            created_at: now,
            expires_at: now + validity_window(),
        }
    }

    /// Uniformly random 6-digit code, leading zeros preserved.
    pub fn generate_code() -> String {
        format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
    }

    /// Decide the state transition for a verification attempt.
    ///
    /// Pure: the caller supplies the clock and applies the store effect.
    /// Check order is deliberate (expiry, then attempts, then equality).
    pub fn evaluate(&self, submitted: &str, now: DateTime<Utc>) -> VerifyOutcome {
        if now > self.expires_at {
            return VerifyOutcome::Expired;
        }
        if self.attempts >= MAX_ATTEMPTS {
            return VerifyOutcome::AttemptsExhausted;
        }
        if self.code == submitted {
            return VerifyOutcome::Verified;
        }
        VerifyOutcome::Mismatch {
            remaining: MAX_ATTEMPTS - (self.attempts + 1),
        }
    }
}

// =============================================================================
// SQL queries - the Postgres backend delegates here
// =============================================================================

impl OtpChallenge {
    /// Remove any challenge for this (channel, purpose), enforcing the
    /// single-active-challenge invariant before a new one is created.
    pub async fn delete_for(
        channel: &str,
        purpose: OtpPurpose,
        pool: &PgPool,
    ) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM otp_challenges WHERE channel = $1 AND purpose = $2")
            .bind(channel)
            .bind(purpose)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn insert(&self, pool: &PgPool) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_challenges (
                id, channel, code, purpose, verified, attempts, created_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(self.id)
        .bind(&self.channel)
        .bind(&self.code)
        .bind(self.purpose)
        .bind(self.verified)
        .bind(self.attempts)
        .bind(self.created_at)
        .bind(self.expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_unverified(
        channel: &str,
        purpose: OtpPurpose,
        pool: &PgPool,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM otp_challenges WHERE channel = $1 AND purpose = $2 AND verified = false",
        )
        .bind(channel)
        .bind(purpose)
        .fetch_optional(pool)
        .await
    }

    pub async fn mark_verified(id: Uuid, pool: &PgPool) -> sqlx::Result<()> {
        sqlx::query("UPDATE otp_challenges SET verified = true WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn increment_attempts(id: Uuid, pool: &PgPool) -> sqlx::Result<i32> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE otp_challenges SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(id: Uuid, pool: &PgPool) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM otp_challenges WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Time-to-live sweep; expiry is also checked lazily on verification.
    pub async fn purge_expired(now: DateTime<Utc>, pool: &PgPool) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM otp_challenges WHERE expires_at < $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge_at(now: DateTime<Utc>) -> OtpChallenge {
        OtpChallenge::new("+919876543210", OtpPurpose::Login, "042137".to_string(), now)
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = OtpChallenge::generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()), "code {}", code);
        }
    }

    #[test]
    fn correct_code_verifies() {
        let now = Utc::now();
        let ch = challenge_at(now);
        assert_eq!(ch.evaluate("042137", now), VerifyOutcome::Verified);
    }

    #[test]
    fn wrong_code_counts_down() {
        let now = Utc::now();
        let mut ch = challenge_at(now);
        assert_eq!(
            ch.evaluate("000000", now),
            VerifyOutcome::Mismatch { remaining: 4 }
        );
        ch.attempts = 4;
        assert_eq!(
            ch.evaluate("000000", now),
            VerifyOutcome::Mismatch { remaining: 0 }
        );
    }

    #[test]
    fn attempt_limit_exhausts() {
        let now = Utc::now();
        let mut ch = challenge_at(now);
        ch.attempts = MAX_ATTEMPTS;
        // Even the correct code fails once the limit is reached.
        assert_eq!(ch.evaluate("042137", now), VerifyOutcome::AttemptsExhausted);
    }

    #[test]
    fn expiry_is_checked_with_injected_clock() {
        let issued = Utc::now();
        let ch = challenge_at(issued);
        let later = issued + Duration::minutes(11);
        assert_eq!(ch.evaluate("042137", later), VerifyOutcome::Expired);
    }

    #[test]
    fn expiry_wins_over_attempt_limit_and_equality() {
        let issued = Utc::now();
        let mut ch = challenge_at(issued);
        ch.attempts = MAX_ATTEMPTS;
        let later = issued + Duration::minutes(11);
        // Expired AND over-limit AND correct code: reports expired.
        assert_eq!(ch.evaluate("042137", later), VerifyOutcome::Expired);
    }

    #[test]
    fn boundary_is_inclusive() {
        let issued = Utc::now();
        let ch = challenge_at(issued);
        // Exactly at expires_at is still valid (now > expires_at transitions).
        assert_eq!(ch.evaluate("042137", ch.expires_at), VerifyOutcome::Verified);
    }

    #[test]
    fn purpose_parse_roundtrip() {
        for p in [
            OtpPurpose::Login,
            OtpPurpose::Registration,
            OtpPurpose::PasswordReset,
        ] {
            assert_eq!(OtpPurpose::parse(p.as_str()), Some(p));
        }
        assert_eq!(OtpPurpose::parse("signup"), None);
    }
}
