//! Page navigation for paginated API lists

use serde::Serialize;

/// Pages shown on each side of the current one
pub const DEFAULT_WINDOW: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub page_size: u32,
}

impl Pagination {
    /// Clamp `requested` into the pages implied by `total_items`
    ///
    /// There is always at least one page, even for an empty list.
    pub fn new(requested: u32, total_items: u64, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let pages = total_items.div_ceil(page_size as u64).max(1);
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
        let current = requested.clamp(1, total_pages);

        Self {
            current,
            total_pages,
            total_items,
            page_size,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total_pages
    }

    pub fn previous(&self) -> Option<u32> {
        self.has_previous().then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.current + 1)
    }

    /// Page numbers within `radius` of the current page
    pub fn window(&self, radius: u32) -> Vec<u32> {
        let start = self.current.saturating_sub(radius).max(1);
        let end = self.current.saturating_add(radius).min(self.total_pages);
        (start..=end).collect()
    }

    pub fn is_single_page(&self) -> bool {
        self.total_pages == 1
    }
}
