//! Pagination types for listing operations.
//!
//! Pages are zero-based. A page past the end is an empty page, never an error.

use serde::{Deserialize, Serialize};

/// Upper bound applied to any requested page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (0-indexed).
    #[serde(default)]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Returns the page size clamped into `1..=max_per_page`.
    #[must_use]
    pub fn effective_per_page(&self, max_per_page: u32) -> u32 {
        self.per_page.clamp(1, max_per_page.max(1))
    }

    /// Calculates the item offset for the given (already clamped) page size.
    #[must_use]
    pub fn offset(&self, per_page: u32) -> u64 {
        u64::from(self.page) * u64::from(per_page)
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number (0-indexed).
    pub page: u32,
    /// Items per page after clamping.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages (0 when there are no items).
    pub total_pages: u64,
}

impl PageMeta {
    /// Computes metadata for `total` items under the given request.
    #[must_use]
    pub fn compute(request: &PageRequest, total: u64, max_per_page: u32) -> Self {
        let per_page = request.effective_per_page(max_per_page);
        Self {
            page: request.page,
            per_page,
            total,
            total_pages: total.div_ceil(u64::from(per_page)),
        }
    }
}

impl<T> PageResponse<T> {
    /// Slices an already ordered result set into the requested page.
    #[must_use]
    pub fn paginate(items: Vec<T>, request: &PageRequest, max_per_page: u32) -> Self {
        let total = u64::try_from(items.len()).unwrap_or(u64::MAX);
        let meta = PageMeta::compute(request, total, max_per_page);
        let offset = usize::try_from(request.offset(meta.per_page)).unwrap_or(usize::MAX);
        let take = usize::try_from(meta.per_page).unwrap_or(usize::MAX);

        let data = items.into_iter().skip(offset).take(take).collect();
        Self { data, meta }
    }

    /// Transforms every item while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }

    /// Returns true if this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
