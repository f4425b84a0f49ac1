// src/models/pagination.rs

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// Raw `page` / `limit` query parameters.
/// Kept as strings so malformed values fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Resolved page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: if limit == 0 { DEFAULT_PAGE_LIMIT } else { limit.min(MAX_PAGE_LIMIT) },
        }
    }

    /// Parses raw query values. Missing, non-numeric or zero values use the defaults.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page.and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        Self::new(page, limit)
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// Paginated list of skills as returned by the catalog and recommendation endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillPage<T> {
    pub skills: Vec<T>,
    pub total: i64,
    pub has_more: bool,
    pub current_page: u32,
}

impl<T> SkillPage<T> {
    /// Wraps one already-fetched page.
    pub fn new(skills: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let has_more = (pagination.offset() + skills.len()) < total.max(0) as usize;
        Self {
            skills,
            total,
            has_more,
            current_page: pagination.page,
        }
    }

    /// Cuts one page out of a fully materialized list.
    pub fn slice(all: Vec<T>, pagination: Pagination) -> Self {
        let total = all.len() as i64;
        let skills: Vec<T> = all
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit as usize)
            .collect();
        Self::new(skills, total, pagination)
    }
}
