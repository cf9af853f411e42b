//! Page/offset normalization shared by every paged listing.

/// Page size used when the caller asks for something outside the allowed range.
pub const DEFAULT_PER_PAGE: u32 = 25;

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

/// A normalized page request.
///
/// `page` is 1-based. Out-of-range inputs are replaced by defaults rather than
/// rejected: a page below 1 becomes 1 and a page size outside `1..=100` becomes 25.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Normalize raw caller input (query string values are signed).
    pub fn new(page: i64, per_page: i64) -> Self {
        let page = if page < 1 { 1 } else { page as u64 };
        let per_page = if (1..=MAX_PER_PAGE as i64).contains(&per_page) {
            per_page as u32
        } else {
            DEFAULT_PER_PAGE
        };
        Self { page, per_page }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Row limit for the store query.
    pub fn limit(&self) -> u32 {
        self.per_page
    }

    /// Row offset for the store query: `(page - 1) * per_page`.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page as u64)
    }
}
