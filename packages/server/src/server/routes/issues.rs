//! Issue reporting and triage endpoints.
//!
//! Citizens create and read their own issues; admin/official roles get the
//! full listing, statistics, status updates, department assignment and
//! deletion.

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::common::pagination::{PageQuery, Pagination};
use crate::domains::issues::models::{
    Department, Issue, IssueCategory, IssueFilter, IssuePriority, IssueStatistics, IssueStatus,
    IssueUpdate, NewIssue,
};
use crate::kernel::{IssueStore, ServerDeps};
use crate::server::error::{ApiError, ValidJson};
use crate::server::middleware::{AuthUser, Staff};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

fn parse_issue_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::Validation("Invalid issue ID".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub voice_transcription: Option<String>,
}

#[derive(Serialize)]
pub struct IssueResponse {
    success: bool,
    message: String,
    issue: Issue,
}

/// POST /api/issues
pub async fn create_issue(
    Extension(deps): Extension<Arc<ServerDeps>>,
    auth: AuthUser,
    ValidJson(body): ValidJson<CreateIssueRequest>,
) -> Result<(StatusCode, Json<IssueResponse>), ApiError> {
    let title = body.title.trim();
    let description = body.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(ApiError::Validation(
            "Missing required fields: title and description".to_string(),
        ));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ApiError::Validation(
            "Title cannot exceed 200 characters".to_string(),
        ));
    }
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::Validation(
            "Description cannot exceed 1000 characters".to_string(),
        ));
    }

    let category = match body.category.as_deref() {
        None | Some("") => IssueCategory::Other,
        Some(raw) => IssueCategory::parse(raw)
            .ok_or_else(|| ApiError::Validation("Invalid category".to_string()))?,
    };

    let issue = deps
        .issues
        .insert(NewIssue {
            title: title.to_string(),
            description: description.to_string(),
            category,
            location: body
                .location
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("Location not provided")
                .to_string(),
            latitude: body.coordinates.as_ref().map(|c| c.lat),
            longitude: body.coordinates.as_ref().map(|c| c.lng),
            voice_transcription: body
                .voice_transcription
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            reported_by: auth.user_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            success: true,
            message: "Issue reported successfully".to_string(),
            issue,
        }),
    ))
}

// Pagination params are inlined rather than flattened: serde_urlencoded
// cannot drive numeric fields through #[serde(flatten)].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIssuesQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListIssuesQuery {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct IssueListResponse {
    success: bool,
    issues: Vec<Issue>,
    pagination: Pagination,
}

fn parse_filter(query: &ListIssuesQuery) -> Result<IssueFilter, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| IssueStatus::parse(s).ok_or_else(|| ApiError::Validation("Invalid status".to_string())))
        .transpose()?;
    let category = query
        .category
        .as_deref()
        .map(|s| {
            IssueCategory::parse(s).ok_or_else(|| ApiError::Validation("Invalid category".to_string()))
        })
        .transpose()?;
    let priority = query
        .priority
        .as_deref()
        .map(|s| {
            IssuePriority::parse(s).ok_or_else(|| ApiError::Validation("Invalid priority".to_string()))
        })
        .transpose()?;

    Ok(IssueFilter {
        status,
        category,
        priority,
        reported_by: None,
    })
}

/// GET /api/issues (admin/official)
pub async fn list_issues(
    Extension(deps): Extension<Arc<ServerDeps>>,
    _staff: Staff,
    Query(query): Query<ListIssuesQuery>,
) -> Result<Json<IssueListResponse>, ApiError> {
    let filter = parse_filter(&query)?;
    let page = query
        .page_query()
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let (issues, total) = deps.issues.list(&filter, &page).await?;

    Ok(Json(IssueListResponse {
        success: true,
        issues,
        pagination: Pagination::build(total, &page),
    }))
}

/// GET /api/issues/my-issues
pub async fn my_issues(
    Extension(deps): Extension<Arc<ServerDeps>>,
    auth: AuthUser,
    Query(query): Query<ListIssuesQuery>,
) -> Result<Json<IssueListResponse>, ApiError> {
    let mut filter = parse_filter(&query)?;
    filter.reported_by = Some(auth.user_id);
    let page = query
        .page_query()
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let (issues, total) = deps.issues.list(&filter, &page).await?;

    Ok(Json(IssueListResponse {
        success: true,
        issues,
        pagination: Pagination::build(total, &page),
    }))
}

#[derive(Serialize)]
pub struct SingleIssueResponse {
    success: bool,
    issue: Issue,
}

/// GET /api/issues/:id
pub async fn get_issue(
    Extension(deps): Extension<Arc<ServerDeps>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SingleIssueResponse>, ApiError> {
    let id = parse_issue_id(&id)?;

    let issue = deps
        .issues
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Issue not found".to_string()))?;

    // Citizens may only see their own reports.
    if !auth.role.can_manage_issues() && issue.reported_by != auth.user_id {
        return Err(ApiError::Forbidden(
            "Access denied. You can only view your own issues".to_string(),
        ));
    }

    Ok(Json(SingleIssueResponse {
        success: true,
        issue,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub admin_notes: Option<String>,
    pub estimated_resolution_time: Option<DateTime<Utc>>,
}

/// PUT /api/issues/:id/status (admin/official)
pub async fn update_issue_status(
    Extension(deps): Extension<Arc<ServerDeps>>,
    _staff: Staff,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateStatusRequest>,
) -> Result<Json<IssueResponse>, ApiError> {
    let id = parse_issue_id(&id)?;

    let status = body
        .status
        .as_deref()
        .map(|s| IssueStatus::parse(s).ok_or_else(|| ApiError::Validation("Invalid status".to_string())))
        .transpose()?;
    let priority = body
        .priority
        .as_deref()
        .map(|s| {
            IssuePriority::parse(s).ok_or_else(|| ApiError::Validation("Invalid priority".to_string()))
        })
        .transpose()?;

    let update = IssueUpdate {
        status,
        priority,
        department: None,
        assigned_to: body.assigned_to,
        admin_notes: body.admin_notes,
        // Resolution is stamped when the status transitions to resolved.
        resolved_at: (status == Some(IssueStatus::Resolved)).then(Utc::now),
        estimated_resolution_at: body.estimated_resolution_time,
    };

    let issue = deps
        .issues
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Issue not found".to_string()))?;

    Ok(Json(IssueResponse {
        success: true,
        message: "Issue updated successfully".to_string(),
        issue,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub department: Option<String>,
}

/// PUT /api/issues/:id/assign (admin/official)
///
/// Routes the issue to a department, marks it in-progress and records the
/// acting staff member as assignee.
pub async fn assign_issue(
    Extension(deps): Extension<Arc<ServerDeps>>,
    Staff(staff): Staff,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<AssignRequest>,
) -> Result<Json<IssueResponse>, ApiError> {
    let id = parse_issue_id(&id)?;

    let department = body
        .department
        .as_deref()
        .and_then(Department::parse)
        .ok_or_else(|| {
            let all: Vec<&str> = Department::ALL.iter().map(|d| d.as_str()).collect();
            ApiError::Validation(format!(
                "Invalid department. Must be one of: {}",
                all.join(", ")
            ))
        })?;

    let update = IssueUpdate {
        status: Some(IssueStatus::InProgress),
        department: Some(department),
        assigned_to: Some(staff.user_id),
        ..Default::default()
    };

    let issue = deps
        .issues
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Issue not found".to_string()))?;

    Ok(Json(IssueResponse {
        success: true,
        message: format!("Issue assigned to {} department", department.as_str()),
        issue,
    }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    success: bool,
    message: String,
}

/// DELETE /api/issues/:id (admin/official)
pub async fn delete_issue(
    Extension(deps): Extension<Arc<ServerDeps>>,
    _staff: Staff,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_issue_id(&id)?;

    if !deps.issues.delete(id).await? {
        return Err(ApiError::NotFound("Issue not found".to_string()));
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: "Issue deleted successfully".to_string(),
    }))
}

#[derive(Serialize)]
pub struct StatisticsResponse {
    success: bool,
    statistics: IssueStatistics,
}

/// GET /api/issues/admin/statistics (admin/official)
pub async fn statistics(
    Extension(deps): Extension<Arc<ServerDeps>>,
    _staff: Staff,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let statistics = deps.issues.statistics().await?;
    Ok(Json(StatisticsResponse {
        success: true,
        statistics,
    }))
}
