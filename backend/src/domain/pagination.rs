//! Page-number pagination shared by listing endpoints.

/// Page used when the caller does not ask for one.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Normalised page request. Page numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request, replacing missing or zero values with defaults and
    /// clamping the page size.
    ///
    /// # Examples
    /// ```
    /// use docket::domain::PageRequest;
    ///
    /// let page = PageRequest::new(Some(3), Some(500));
    /// assert_eq!(page.page_size(), 100);
    /// assert_eq!(page.offset(), 200);
    /// ```
    #[must_use]
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            page_size: page_size
                .filter(|s| *s > 0)
                .map_or(DEFAULT_PAGE_SIZE, |s| s.min(MAX_PAGE_SIZE)),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    /// Number of rows to return.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            page_size: request.page_size(),
            total,
        }
    }

    /// Number of pages needed to show `total` rows.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size.max(1)))
    }

    /// Transform every item, keeping the paging envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}
