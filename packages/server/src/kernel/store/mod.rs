//! Storage abstraction.
//!
//! One set of repository traits with two interchangeable backends: Postgres
//! (sqlx) and an in-process fallback. The backend is selected once at
//! startup; if the database cannot be reached the server runs entirely on
//! the fallback so the dev/demo flow keeps working. The fallback holds the
//! same invariants (unique email/mobile, single active OTP challenge per
//! (channel, purpose), 5 attempts, 10-minute expiry) but is scoped to one
//! process and lost on restart - not for multi-instance deployment.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::common::pagination::PageArgs;
use crate::domains::auth::models::{NewUser, OtpChallenge, OtpPurpose, User};
use crate::domains::issues::models::{Issue, IssueFilter, IssueStatistics, IssueUpdate, NewIssue};

/// Storage failures, mapped to the API error taxonomy at the boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field (email, mobile number) already holds this value.
    #[error("Duplicate value for unique field: {0}")]
    Conflict(&'static str),

    /// The persistence layer is unreachable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                // Constraint names are set in the migrations.
                let field = if db.constraint() == Some("users_mobile_number_key") {
                    "mobile number"
                } else {
                    "email"
                };
                StoreError::Conflict(field)
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            _ => StoreError::Other(e.into()),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_mobile(&self, mobile_number: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError>;
    async fn mark_mobile_verified(&self, id: Uuid) -> Result<(), StoreError>;
    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError>;
    /// The only write path for the credential after registration; the hash
    /// is produced by the caller, never conditionally re-derived on save.
    async fn update_credential(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Delete any challenge for (channel, purpose) - the supersede step.
    async fn delete_for(&self, channel: &str, purpose: OtpPurpose) -> Result<(), StoreError>;
    async fn insert(&self, challenge: &OtpChallenge) -> Result<(), StoreError>;
    async fn find_unverified(
        &self,
        channel: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>, StoreError>;
    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError>;
    /// Returns the new attempt count.
    async fn increment_attempts(&self, id: Uuid) -> Result<i32, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
    /// TTL sweep; returns the number of records removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn insert(&self, new_issue: NewIssue) -> Result<Issue, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, StoreError>;
    async fn list(
        &self,
        filter: &IssueFilter,
        page: &PageArgs,
    ) -> Result<(Vec<Issue>, u64), StoreError>;
    async fn update(&self, id: Uuid, update: &IssueUpdate) -> Result<Option<Issue>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn statistics(&self) -> Result<IssueStatistics, StoreError>;
}

/// Which backend the server ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => write!(f, "postgres"),
            StorageBackend::Memory => write!(f, "memory (fallback)"),
        }
    }
}

/// The selected store trio.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub otps: Arc<dyn OtpStore>,
    pub issues: Arc<dyn IssueStore>,
    pub backend: StorageBackend,
}

impl Stores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Stores {
            users: store.clone(),
            otps: store.clone(),
            issues: store,
            backend: StorageBackend::Postgres,
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Stores {
            users: store.clone(),
            otps: store.clone(),
            issues: store,
            backend: StorageBackend::Memory,
        }
    }
}

/// Connect to the configured database, falling back to the in-process store
/// when it is unreachable. This is a substitution, not a retry: the choice
/// holds for the process lifetime.
pub async fn connect(database_url: &str) -> Stores {
    match try_postgres(database_url).await {
        Ok(pool) => {
            tracing::info!("Database connected, migrations applied");
            Stores::postgres(pool)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Database unreachable - substituting in-process fallback store \
                 (single process, lost on restart)"
            );
            Stores::memory(Arc::new(MemoryStore::seeded()))
        }
    }
}

async fn try_postgres(database_url: &str) -> anyhow::Result<sqlx::PgPool> {
    use anyhow::Context;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}
