//! Listing parameters shared by the stores: page window, search term and
//! a whitelisted sort key.

use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 {
            return Err(DomainError::Validation("page must be >= 1".into()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(DomainError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub const fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self { items, total, page: request.page(), page_size: request.page_size() }
    }

    pub fn next(&self) -> Option<u32> {
        let seen = i64::from(self.page) * i64::from(self.page_size);
        (seen < self.total).then_some(self.page + 1)
    }

    pub fn previous(&self) -> Option<u32> {
        (self.page > 1).then(|| self.page - 1)
    }

    /// Pages past the first must contain something.
    pub fn is_out_of_range(&self) -> bool {
        self.page > 1 && self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Sort direction parsed from a `-field` / `field` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering<F> {
    pub field: F,
    pub descending: bool,
}

impl<F: FromStr<Err = DomainError>> FromStr for Ordering<F> {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, key) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        Ok(Self { field: key.parse()?, descending })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscussionSort {
    CreatedAt,
    UpdatedAt,
}

impl FromStr for DiscussionSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            other => Err(DomainError::Validation(format!("cannot order discussions by '{other}'"))),
        }
    }
}

impl Default for Ordering<DiscussionSort> {
    fn default() -> Self {
        Self { field: DiscussionSort::UpdatedAt, descending: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSort {
    CreatedAt,
    ReliabilityScore,
}

impl FromStr for AnalysisSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "reliability_score" => Ok(Self::ReliabilityScore),
            other => Err(DomainError::Validation(format!("cannot order analyses by '{other}'"))),
        }
    }
}

impl Default for Ordering<AnalysisSort> {
    fn default() -> Self {
        Self { field: AnalysisSort::CreatedAt, descending: true }
    }
}

/// Filter for listing discussions. `owner = None` means every owner (admin view).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscussionQuery {
    pub owner: Option<Uuid>,
    pub search: Option<String>,
    pub ordering: Ordering<DiscussionSort>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisQuery {
    pub discussion_id: Uuid,
    pub search: Option<String>,
    pub ordering: Ordering<AnalysisSort>,
    pub page: PageRequest,
}

impl AnalysisQuery {
    pub fn newest_first(discussion_id: Uuid) -> Self {
        Self {
            discussion_id,
            search: None,
            ordering: Ordering::default(),
            page: PageRequest::default(),
        }
    }
}
