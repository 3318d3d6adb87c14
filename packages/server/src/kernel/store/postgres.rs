//! Postgres backend. Thin delegation to the SQL that lives on the models.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{IssueStore, OtpStore, StoreError, UserStore};
use crate::common::pagination::PageArgs;
use crate::domains::auth::models::{NewUser, OtpChallenge, OtpPurpose, User};
use crate::domains::issues::models::{Issue, IssueFilter, IssueStatistics, IssueUpdate, NewIssue};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(email, &self.pool).await?)
    }

    async fn find_by_mobile(&self, mobile_number: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_mobile(mobile_number, &self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(id, &self.pool).await?)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        Ok(User::from_new(new_user).insert(&self.pool).await?)
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(User::set_email_verified(id, &self.pool).await?)
    }

    async fn mark_mobile_verified(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(User::set_mobile_verified(id, &self.pool).await?)
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(User::touch_last_login(id, &self.pool).await?)
    }

    async fn update_credential(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        Ok(User::update_credential(id, password_hash, &self.pool).await?)
    }
}

#[async_trait]
impl OtpStore for PgStore {
    async fn delete_for(&self, channel: &str, purpose: OtpPurpose) -> Result<(), StoreError> {
        Ok(OtpChallenge::delete_for(channel, purpose, &self.pool).await?)
    }

    async fn insert(&self, challenge: &OtpChallenge) -> Result<(), StoreError> {
        Ok(challenge.insert(&self.pool).await?)
    }

    async fn find_unverified(
        &self,
        channel: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>, StoreError> {
        Ok(OtpChallenge::find_unverified(channel, purpose, &self.pool).await?)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(OtpChallenge::mark_verified(id, &self.pool).await?)
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<i32, StoreError> {
        Ok(OtpChallenge::increment_attempts(id, &self.pool).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(OtpChallenge::delete(id, &self.pool).await?)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(OtpChallenge::purge_expired(now, &self.pool).await?)
    }
}

#[async_trait]
impl IssueStore for PgStore {
    async fn insert(&self, new_issue: NewIssue) -> Result<Issue, StoreError> {
        Ok(Issue::from_new(new_issue).insert(&self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, StoreError> {
        Ok(Issue::find_by_id(id, &self.pool).await?)
    }

    async fn list(
        &self,
        filter: &IssueFilter,
        page: &PageArgs,
    ) -> Result<(Vec<Issue>, u64), StoreError> {
        Ok(Issue::list(filter, page, &self.pool).await?)
    }

    async fn update(&self, id: Uuid, update: &IssueUpdate) -> Result<Option<Issue>, StoreError> {
        Ok(Issue::update(id, update, &self.pool).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Issue::delete(id, &self.pool).await?)
    }

    async fn statistics(&self) -> Result<IssueStatistics, StoreError> {
        Ok(Issue::statistics(&self.pool).await?)
    }
}
