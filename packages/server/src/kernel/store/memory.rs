//! In-process fallback store.
//!
//! Stands in for the database when it is unreachable so issuance,
//! verification and lookups keep working for a single process lifetime.
//! Holds the same invariants as the Postgres backend. Seeded with a small
//! fixed set of demo identities. Explicitly constructed and injected -
//! tests build fresh, isolated instances.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{IssueStore, OtpStore, StoreError, UserStore};
use crate::common::pagination::{PageArgs, SortColumn};
use crate::domains::auth::models::{NewUser, OtpChallenge, OtpPurpose, Role, User};
use crate::domains::issues::models::{
    CategoryCount, Issue, IssueFilter, IssueStatistics, IssueStatus, IssueUpdate, NewIssue,
    StatusCount,
};

/// Placeholder credential for seeded demo identities. Well-formed bcrypt so
/// comparison fails cleanly; demo users log in via OTP, not password.
const DEMO_CREDENTIAL: &str = "$2b$12$abcdefghijklmnopqrstuvabcdefghijklmnopqrstuvwxyzABCDE";

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    otps: RwLock<Vec<OtpChallenge>>,
    issues: RwLock<Vec<Issue>>,
}

impl MemoryStore {
    /// Empty store (tests).
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the demo identities the dev flow expects.
    pub fn seeded() -> Self {
        let store = Self::new();
        let seeds = [
            ("Test User", "test@example.com", "+919876543210"),
            ("Another User", "user@test.com", "+919123456789"),
        ];
        {
            let mut users = store.users.try_write().expect("fresh lock");
            for (name, email, mobile) in seeds {
                users.push(User::from_new(NewUser {
                    full_name: name.to_string(),
                    email: email.to_string(),
                    mobile_number: mobile.to_string(),
                    password_hash: DEMO_CREDENTIAL.to_string(),
                    role: Role::Citizen,
                }));
            }
        }
        store
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_mobile(&self, mobile_number: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.mobile_number == mobile_number).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict("email"));
        }
        if users.iter().any(|u| u.mobile_number == new_user.mobile_number) {
            return Err(StoreError::Conflict("mobile number"));
        }
        let user = User::from_new(new_user);
        users.push(user.clone());
        Ok(user)
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.email_verified = true;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_mobile_verified(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.mobile_verified = true;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(Utc::now());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_credential(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn delete_for(&self, channel: &str, purpose: OtpPurpose) -> Result<(), StoreError> {
        let mut otps = self.otps.write().await;
        otps.retain(|c| !(c.channel == channel && c.purpose == purpose));
        Ok(())
    }

    async fn insert(&self, challenge: &OtpChallenge) -> Result<(), StoreError> {
        let mut otps = self.otps.write().await;
        otps.push(challenge.clone());
        Ok(())
    }

    async fn find_unverified(
        &self,
        channel: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>, StoreError> {
        let otps = self.otps.read().await;
        Ok(otps
            .iter()
            .find(|c| c.channel == channel && c.purpose == purpose && !c.verified)
            .cloned())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError> {
        let mut otps = self.otps.write().await;
        if let Some(challenge) = otps.iter_mut().find(|c| c.id == id) {
            challenge.verified = true;
        }
        Ok(())
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<i32, StoreError> {
        let mut otps = self.otps.write().await;
        match otps.iter_mut().find(|c| c.id == id) {
            Some(challenge) => {
                challenge.attempts += 1;
                Ok(challenge.attempts)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut otps = self.otps.write().await;
        otps.retain(|c| c.id != id);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut otps = self.otps.write().await;
        let before = otps.len();
        otps.retain(|c| c.expires_at >= now);
        Ok((before - otps.len()) as u64)
    }
}

fn filter_matches(filter: &IssueFilter, issue: &Issue) -> bool {
    filter.status.map_or(true, |s| issue.status == s)
        && filter.category.map_or(true, |c| issue.category == c)
        && filter.priority.map_or(true, |p| issue.priority == p)
        && filter.reported_by.map_or(true, |r| issue.reported_by == r)
}

fn compare(a: &Issue, b: &Issue, column: SortColumn) -> Ordering {
    match column {
        SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        SortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortColumn::Priority => (a.priority as u8).cmp(&(b.priority as u8)),
        SortColumn::Status => (a.status as u8).cmp(&(b.status as u8)),
        SortColumn::Category => (a.category as u8).cmp(&(b.category as u8)),
        SortColumn::Title => a.title.cmp(&b.title),
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn insert(&self, new_issue: NewIssue) -> Result<Issue, StoreError> {
        let mut issues = self.issues.write().await;
        let issue = Issue::from_new(new_issue);
        issues.push(issue.clone());
        Ok(issue)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, StoreError> {
        let issues = self.issues.read().await;
        Ok(issues.iter().find(|i| i.id == id).cloned())
    }

    async fn list(
        &self,
        filter: &IssueFilter,
        page: &PageArgs,
    ) -> Result<(Vec<Issue>, u64), StoreError> {
        let issues = self.issues.read().await;
        let mut selected: Vec<Issue> = issues.iter().filter(|i| filter_matches(filter, i)).cloned().collect();
        let total = selected.len() as u64;

        selected.sort_by(|a, b| {
            let ord = compare(a, b, page.sort_by);
            if page.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let page_items = selected
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.fetch_limit() as usize)
            .collect();

        Ok((page_items, total))
    }

    async fn update(&self, id: Uuid, update: &IssueUpdate) -> Result<Option<Issue>, StoreError> {
        let mut issues = self.issues.write().await;
        let Some(issue) = issues.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            issue.status = status;
        }
        if let Some(priority) = update.priority {
            issue.priority = priority;
        }
        if let Some(department) = update.department {
            issue.department = Some(department);
        }
        if let Some(assigned_to) = update.assigned_to {
            issue.assigned_to = Some(assigned_to);
        }
        if let Some(notes) = &update.admin_notes {
            issue.admin_notes = Some(notes.clone());
        }
        if let Some(resolved_at) = update.resolved_at {
            issue.resolved_at = Some(resolved_at);
        }
        if let Some(eta) = update.estimated_resolution_at {
            issue.estimated_resolution_at = Some(eta);
        }
        issue.updated_at = Utc::now();
        Ok(Some(issue.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut issues = self.issues.write().await;
        let before = issues.len();
        issues.retain(|i| i.id != id);
        Ok(issues.len() < before)
    }

    async fn statistics(&self) -> Result<IssueStatistics, StoreError> {
        let issues = self.issues.read().await;

        let count_status =
            |status: IssueStatus| issues.iter().filter(|i| i.status == status).count() as i64;

        let by_status: Vec<StatusCount> = IssueStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: count_status(status),
            })
            .filter(|c| c.count > 0)
            .collect();

        let by_category: Vec<CategoryCount> = crate::domains::issues::models::IssueCategory::ALL
            .iter()
            .map(|&category| CategoryCount {
                category,
                count: issues.iter().filter(|i| i.category == category).count() as i64,
            })
            .filter(|c| c.count > 0)
            .collect();

        Ok(IssueStatistics {
            total: issues.len() as i64,
            resolved: count_status(IssueStatus::Resolved),
            pending: count_status(IssueStatus::Pending),
            in_progress: count_status(IssueStatus::InProgress),
            by_status,
            by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::pagination::PageQuery;
    use crate::domains::issues::models::{IssueCategory, IssuePriority};

    fn new_user(email: &str, mobile: &str) -> NewUser {
        NewUser {
            full_name: "Test User".to_string(),
            email: email.to_string(),
            mobile_number: mobile.to_string(),
            password_hash: "hash".to_string(),
            role: Role::Citizen,
        }
    }

    #[tokio::test]
    async fn seeded_identities_are_present() {
        let store = MemoryStore::seeded();
        assert!(store
            .find_by_mobile("+919876543210")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_email("test@example.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        UserStore::insert(&store, new_user("a@test.com", "+919000000001"))
            .await
            .unwrap();
        let err = UserStore::insert(&store, new_user("a@test.com", "+919000000002"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict("email")));
    }

    #[tokio::test]
    async fn duplicate_mobile_conflicts() {
        let store = MemoryStore::new();
        UserStore::insert(&store, new_user("a@test.com", "+919000000001"))
            .await
            .unwrap();
        let err = UserStore::insert(&store, new_user("b@test.com", "+919000000001"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict("mobile number")));
    }

    #[tokio::test]
    async fn update_credential_replaces_hash() {
        let store = MemoryStore::new();
        let user = UserStore::insert(&store, new_user("a@test.com", "+919000000001"))
            .await
            .unwrap();
        store.update_credential(user.id, "new-hash").await.unwrap();
        let reloaded = UserStore::find_by_id(&store, user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn supersede_leaves_one_challenge() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = OtpChallenge::new("+919000000001", OtpPurpose::Login, "111111".into(), now);
        store.delete_for(&first.channel, first.purpose).await.unwrap();
        OtpStore::insert(&store, &first).await.unwrap();

        let second = OtpChallenge::new("+919000000001", OtpPurpose::Login, "222222".into(), now);
        store.delete_for(&second.channel, second.purpose).await.unwrap();
        OtpStore::insert(&store, &second).await.unwrap();

        let active = store
            .find_unverified("+919000000001", OtpPurpose::Login)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.code, "222222");
    }

    #[tokio::test]
    async fn purposes_are_scoped_independently() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let login = OtpChallenge::new("+919000000001", OtpPurpose::Login, "111111".into(), now);
        let reg =
            OtpChallenge::new("+919000000001", OtpPurpose::Registration, "222222".into(), now);
        OtpStore::insert(&store, &login).await.unwrap();
        OtpStore::insert(&store, &reg).await.unwrap();

        store
            .delete_for("+919000000001", OtpPurpose::Login)
            .await
            .unwrap();
        assert!(store
            .find_unverified("+919000000001", OtpPurpose::Login)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_unverified("+919000000001", OtpPurpose::Registration)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let old = OtpChallenge::new(
            "+919000000001",
            OtpPurpose::Login,
            "111111".into(),
            now - chrono::Duration::minutes(30),
        );
        let fresh = OtpChallenge::new("+919000000002", OtpPurpose::Login, "222222".into(), now);
        OtpStore::insert(&store, &old).await.unwrap();
        OtpStore::insert(&store, &fresh).await.unwrap();

        let purged = store.purge_expired(now).await.unwrap();
        assert_eq!(purged, 1);
        assert!(store
            .find_unverified("+919000000002", OtpPurpose::Login)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn list_filters_sorts_and_paginates() {
        let store = MemoryStore::new();
        let reporter = Uuid::new_v4();
        for i in 0..15 {
            IssueStore::insert(&store, NewIssue {
                    title: format!("Issue {:02}", i),
                    description: "d".to_string(),
                    category: IssueCategory::Pothole,
                    location: "loc".to_string(),
                    latitude: None,
                    longitude: None,
                    voice_transcription: None,
                    reported_by: reporter,
                })
                .await
                .unwrap();
        }
        IssueStore::insert(&store, NewIssue {
                title: "Someone else's".to_string(),
                description: "d".to_string(),
                category: IssueCategory::Garbage,
                location: "loc".to_string(),
                latitude: None,
                longitude: None,
                voice_transcription: None,
                reported_by: Uuid::new_v4(),
            })
            .await
            .unwrap();

        let filter = IssueFilter {
            reported_by: Some(reporter),
            ..Default::default()
        };
        let page = PageQuery {
            page: Some(2),
            limit: Some(10),
            sort_by: Some("title".to_string()),
            sort_order: Some("asc".to_string()),
        }
        .validate()
        .unwrap();

        let (items, total) = store.list(&filter, &page).await.unwrap();
        assert_eq!(total, 15);
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].title, "Issue 10");
    }

    #[tokio::test]
    async fn statistics_counts_by_status() {
        let store = MemoryStore::new();
        let reporter = Uuid::new_v4();
        for _ in 0..3 {
            IssueStore::insert(&store, NewIssue {
                    title: "t".to_string(),
                    description: "d".to_string(),
                    category: IssueCategory::Sewage,
                    location: "loc".to_string(),
                    latitude: None,
                    longitude: None,
                    voice_transcription: None,
                    reported_by: reporter,
                })
                .await
                .unwrap();
        }
        let issues = IssueStore::list(&store, &IssueFilter::default(), &PageQuery::default().validate().unwrap())
            .await
            .unwrap()
            .0;
        store
            .update(
                issues[0].id,
                &IssueUpdate {
                    status: Some(IssueStatus::Resolved),
                    resolved_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stats = store.statistics().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.by_category.len(), 1);
        assert_eq!(stats.by_category[0].count, 3);
    }

    #[tokio::test]
    async fn priority_update_applies() {
        let store = MemoryStore::new();
        let issue = IssueStore::insert(&store, NewIssue {
                title: "t".to_string(),
                description: "d".to_string(),
                category: IssueCategory::Other,
                location: "loc".to_string(),
                latitude: None,
                longitude: None,
                voice_transcription: None,
                reported_by: Uuid::new_v4(),
            })
            .await
            .unwrap();

        let updated = store
            .update(
                issue.id,
                &IssueUpdate {
                    priority: Some(IssuePriority::Urgent),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.priority, IssuePriority::Urgent);
        // Untouched fields retain their values.
        assert_eq!(updated.status, IssueStatus::Pending);
    }
}
