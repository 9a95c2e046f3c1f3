//! Page-based pagination shared by the history queries and the HTTP layer.

use serde::Serialize;
use thiserror::Error;

/// Default number of entries per page.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("page must be at least 1, got {0}")]
    InvalidPage(u32),

    #[error("page size must be between 1 and {max}, got {requested}")]
    InvalidPageSize { requested: u32, max: u32 },
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Creates a page request, rejecting a zero page or a page size outside `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::InvalidPage(page));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(PaginationError::InvalidPageSize {
                requested: page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self { page, page_size })
    }

    /// Builds a request from optional query parameters, filling in defaults.
    pub fn from_params(page: Option<u32>, page_size: Option<u32>) -> Result<Self, PaginationError> {
        Self::new(page.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// Returns the 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the number of items per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of entries to skip.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    /// Returns the maximum number of items on this page.
    pub fn limit(&self) -> usize {
        self.page_size as usize
    }

    /// Slices an already filtered and ordered collection.
    pub fn slice<T>(&self, items: Vec<T>) -> (Vec<T>, PageMeta) {
        let total = items.len() as u64;
        let page = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect();
        (page, PageMeta::new(*self, total))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u64,
    pub total: u64,
}

impl PageMeta {
    /// Builds the metadata for a page out of `total` items.
    pub fn new(request: PageRequest, total: u64) -> Self {
        let size = u64::from(request.page_size);
        Self {
            page: request.page,
            page_size: request.page_size,
            page_count: total.div_ceil(size),
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_params() {
        let req = PageRequest::from_params(None, None).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn rejects_zero_page_and_oversized_pages() {
        assert_eq!(PageRequest::new(0, 10), Err(PaginationError::InvalidPage(0)));
        assert!(matches!(
            PageRequest::new(1, MAX_PAGE_SIZE + 1),
            Err(PaginationError::InvalidPageSize { .. })
        ));
        assert!(PageRequest::new(1, 0).is_err());
    }

    #[test]
    fn slice_returns_requested_window() {
        let req = PageRequest::new(2, 3).unwrap();
        let (page, meta) = req.slice((1..=8).collect::<Vec<_>>());
        assert_eq!(page, vec![4, 5, 6]);
        assert_eq!(meta.total, 8);
        assert_eq!(meta.page_count, 3);
    }

    #[test]
    fn slice_past_the_end_is_empty() {
        let req = PageRequest::new(5, 10).unwrap();
        let (page, meta) = req.slice(vec![1, 2, 3]);
        assert!(page.is_empty());
        assert_eq!(meta.page_count, 1);
    }

    #[test]
    fn empty_collection_has_zero_pages() {
        let meta = PageMeta::new(PageRequest::default(), 0);
        assert_eq!(meta.page_count, 0);
    }
}
