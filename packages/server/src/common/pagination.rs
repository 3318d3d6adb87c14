//! Offset-based pagination for list endpoints.
//!
//! Query parameters follow the `page`/`limit`/`sortBy`/`sortOrder` convention
//! the frontend already speaks. Responses carry a `pagination` block with the
//! current page, page count, total rows and the applied limit.

use serde::{Deserialize, Serialize};

/// Columns a caller is allowed to sort by.
///
/// Closed set so the sort expression can be spliced into SQL safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    CreatedAt,
    UpdatedAt,
    Priority,
    Status,
    Category,
    Title,
}

impl SortColumn {
    /// Wire name as the frontend sends it.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(SortColumn::CreatedAt),
            "updatedAt" => Some(SortColumn::UpdatedAt),
            "priority" => Some(SortColumn::Priority),
            "status" => Some(SortColumn::Status),
            "category" => Some(SortColumn::Category),
            "title" => Some(SortColumn::Title),
            _ => None,
        }
    }

    /// Column name in the issues table.
    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
            SortColumn::Priority => "priority",
            SortColumn::Status => "status",
            SortColumn::Category => "category",
            SortColumn::Title => "title",
        }
    }
}

/// Raw pagination query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PageQuery {
    /// Validate and normalize: page >= 1, limit clamped to 1-100,
    /// sort column checked against the whitelist.
    pub fn validate(&self) -> Result<PageArgs, &'static str> {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(10).clamp(1, 100);

        let sort_by = match self.sort_by.as_deref() {
            None => SortColumn::CreatedAt,
            Some(s) => SortColumn::parse(s).ok_or("Invalid sort column")?,
        };

        let descending = match self.sort_order.as_deref() {
            None | Some("desc") => true,
            Some("asc") => false,
            Some(_) => return Err("sortOrder must be 'asc' or 'desc'"),
        };

        Ok(PageArgs {
            page,
            limit,
            sort_by,
            descending,
        })
    }
}

/// Validated pagination arguments.
#[derive(Debug, Clone, Copy)]
pub struct PageArgs {
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortColumn,
    pub descending: bool,
}

impl PageArgs {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn fetch_limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

/// Pagination block included in list responses.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: u64,
    pub limit: u32,
}

impl Pagination {
    pub fn build(total: u64, args: &PageArgs) -> Self {
        let pages = (total.div_ceil(u64::from(args.limit))) as u32;
        Pagination {
            current: args.page,
            pages,
            total,
            limit: args.limit,
        }
    }
}
