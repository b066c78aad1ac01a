//! Pagination helper types for repository queries

use serde::{Deserialize, Serialize};

/// Page request, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(2, 25);
    /// assert_eq!(request.offset(), 50);
    /// assert_eq!(request.limit(), 25);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// SQL `OFFSET`
    pub fn offset(&self) -> u32 {
        self.page.saturating_mul(self.page_size)
    }

    /// SQL `LIMIT`
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 100,
        }
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let total_pages = if request.page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(request.page_size)) as u32
        };

        Self {
            items,
            total,
            page: request.page,
            total_pages,
            page_size: request.page_size,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            total_pages: self.total_pages,
            page_size: self.page_size,
        }
    }
}
