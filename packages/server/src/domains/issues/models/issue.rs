use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::common::pagination::PageArgs;

/// Issue category. Closed set; labels match what the frontend displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_category")]
pub enum IssueCategory {
    Pothole,
    Streetlight,
    Garbage,
    #[sqlx(rename = "Water Supply")]
    #[serde(rename = "Water Supply")]
    WaterSupply,
    Sewage,
    #[sqlx(rename = "Road Damage")]
    #[serde(rename = "Road Damage")]
    RoadDamage,
    Traffic,
    Other,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 8] = [
        IssueCategory::Pothole,
        IssueCategory::Streetlight,
        IssueCategory::Garbage,
        IssueCategory::WaterSupply,
        IssueCategory::Sewage,
        IssueCategory::RoadDamage,
        IssueCategory::Traffic,
        IssueCategory::Other,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pothole" => Some(IssueCategory::Pothole),
            "Streetlight" => Some(IssueCategory::Streetlight),
            "Garbage" => Some(IssueCategory::Garbage),
            "Water Supply" => Some(IssueCategory::WaterSupply),
            "Sewage" => Some(IssueCategory::Sewage),
            "Road Damage" => Some(IssueCategory::RoadDamage),
            "Traffic" => Some(IssueCategory::Traffic),
            "Other" => Some(IssueCategory::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Pothole => "Pothole",
            IssueCategory::Streetlight => "Streetlight",
            IssueCategory::Garbage => "Garbage",
            IssueCategory::WaterSupply => "Water Supply",
            IssueCategory::Sewage => "Sewage",
            IssueCategory::RoadDamage => "Road Damage",
            IssueCategory::Traffic => "Traffic",
            IssueCategory::Other => "Other",
        }
    }
}

/// Lifecycle status: pending -> in-progress -> resolved | rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 4] = [
        IssueStatus::Pending,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Rejected,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(IssueStatus::Pending),
            "in-progress" => Some(IssueStatus::InProgress),
            "resolved" => Some(IssueStatus::Resolved),
            "rejected" => Some(IssueStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "pending",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl IssuePriority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(IssuePriority::Low),
            "medium" => Some(IssuePriority::Medium),
            "high" => Some(IssuePriority::High),
            "urgent" => Some(IssuePriority::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssuePriority::Low => "low",
            IssuePriority::Medium => "medium",
            IssuePriority::High => "high",
            IssuePriority::Urgent => "urgent",
        }
    }
}

/// Municipal department an issue can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "department", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Department {
    PublicWorks,
    Transportation,
    Sanitation,
    WaterSupply,
    Electricity,
    Housing,
    Health,
    Education,
    Parks,
    Security,
}

impl Department {
    pub const ALL: [Department; 10] = [
        Department::PublicWorks,
        Department::Transportation,
        Department::Sanitation,
        Department::WaterSupply,
        Department::Electricity,
        Department::Housing,
        Department::Health,
        Department::Education,
        Department::Parks,
        Department::Security,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::PublicWorks => "public-works",
            Department::Transportation => "transportation",
            Department::Sanitation => "sanitation",
            Department::WaterSupply => "water-supply",
            Department::Electricity => "electricity",
            Department::Housing => "housing",
            Department::Health => "health",
            Department::Education => "education",
            Department::Parks => "parks",
            Department::Security => "security",
        }
    }
}

/// A citizen-reported issue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub voice_transcription: Option<String>,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub department: Option<Department>,
    pub assigned_to: Option<Uuid>,
    pub reported_by: Uuid,
    pub admin_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(rename = "estimatedResolutionTime")]
    pub estimated_resolution_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an issue.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub voice_transcription: Option<String>,
    pub reported_by: Uuid,
}

impl Issue {
    pub fn from_new(new: NewIssue) -> Self {
        let now = Utc::now();
        Issue {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            category: new.category,
            location: new.location,
            latitude: new.latitude,
            longitude: new.longitude,
            voice_transcription: new.voice_transcription,
            status: IssueStatus::Pending,
            priority: IssuePriority::Medium,
            department: None,
            assigned_to: None,
            reported_by: new.reported_by,
            admin_notes: None,
            resolved_at: None,
            estimated_resolution_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filter for list queries. All fields optional; present fields AND together.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<IssueCategory>,
    pub priority: Option<IssuePriority>,
    pub reported_by: Option<Uuid>,
}

/// Partial update applied by staff. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub department: Option<Department>,
    pub assigned_to: Option<Uuid>,
    pub admin_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub estimated_resolution_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: IssueStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: IssueCategory,
    pub count: i64,
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStatistics {
    pub total: i64,
    pub resolved: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub by_status: Vec<StatusCount>,
    pub by_category: Vec<CategoryCount>,
}

// =============================================================================
// SQL queries - the Postgres backend delegates here
// =============================================================================

fn push_filters<'a>(builder: &mut QueryBuilder<'a, sqlx::Postgres>, filter: &'a IssueFilter) {
    let mut sep = " WHERE ";
    if let Some(status) = filter.status {
        builder.push(sep).push("status = ").push_bind(status);
        sep = " AND ";
    }
    if let Some(category) = filter.category {
        builder.push(sep).push("category = ").push_bind(category);
        sep = " AND ";
    }
    if let Some(priority) = filter.priority {
        builder.push(sep).push("priority = ").push_bind(priority);
        sep = " AND ";
    }
    if let Some(reported_by) = filter.reported_by {
        builder.push(sep).push("reported_by = ").push_bind(reported_by);
    }
}

impl Issue {
    pub async fn insert(&self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issues (
                id, title, description, category, location, latitude, longitude,
                voice_transcription, status, priority, department, assigned_to,
                reported_by, admin_notes, resolved_at, estimated_resolution_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.category)
        .bind(&self.location)
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(&self.voice_transcription)
        .bind(self.status)
        .bind(self.priority)
        .bind(self.department)
        .bind(self.assigned_to)
        .bind(self.reported_by)
        .bind(&self.admin_notes)
        .bind(self.resolved_at)
        .bind(self.estimated_resolution_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM issues WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Filtered, sorted, paginated listing plus the total row count for the
    /// same filter.
    pub async fn list(
        filter: &IssueFilter,
        page: &PageArgs,
        pool: &PgPool,
    ) -> sqlx::Result<(Vec<Self>, u64)> {
        let mut builder = QueryBuilder::new("SELECT * FROM issues");
        push_filters(&mut builder, filter);
        builder.push(format!(
            " ORDER BY {} {}",
            page.sort_by.column(),
            if page.descending { "DESC" } else { "ASC" }
        ));
        builder.push(" LIMIT ").push_bind(page.fetch_limit());
        builder.push(" OFFSET ").push_bind(page.offset());

        let issues = builder.build_query_as::<Self>().fetch_all(pool).await?;

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM issues");
        push_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(pool)
            .await?;

        Ok((issues, total as u64))
    }

    pub async fn update(
        id: Uuid,
        update: &IssueUpdate,
        pool: &PgPool,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE issues SET
                status = COALESCE($2, status),
                priority = COALESCE($3, priority),
                department = COALESCE($4, department),
                assigned_to = COALESCE($5, assigned_to),
                admin_notes = COALESCE($6, admin_notes),
                resolved_at = COALESCE($7, resolved_at),
                estimated_resolution_at = COALESCE($8, estimated_resolution_at),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.status)
        .bind(update.priority)
        .bind(update.department)
        .bind(update.assigned_to)
        .bind(&update.admin_notes)
        .bind(update.resolved_at)
        .bind(update.estimated_resolution_at)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(id: Uuid, pool: &PgPool) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn statistics(pool: &PgPool) -> sqlx::Result<IssueStatistics> {
        let by_status: Vec<(IssueStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM issues GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?;

        let by_category: Vec<(IssueCategory, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM issues GROUP BY category ORDER BY category",
        )
        .fetch_all(pool)
        .await?;

        let count_for = |status: IssueStatus| {
            by_status
                .iter()
                .find(|(s, _)| *s == status)
                .map(|(_, n)| *n)
                .unwrap_or(0)
        };

        Ok(IssueStatistics {
            total: by_status.iter().map(|(_, n)| n).sum(),
            resolved: count_for(IssueStatus::Resolved),
            pending: count_for(IssueStatus::Pending),
            in_progress: count_for(IssueStatus::InProgress),
            by_status: by_status
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            by_category: by_category
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
        })
    }
}
