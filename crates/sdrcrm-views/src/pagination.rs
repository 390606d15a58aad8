//! Client-side windowing over an in-memory list

use serde::Serialize;
use std::ops::Range;

/// Page cursor over `len` items, `page_size` per page.
///
/// Pages are 1-based. There is always at least one page, and the current
/// page is kept within `[1, total_pages]` whatever the caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MiniPagination {
    len: usize,
    page_size: usize,
    page: usize,
}

impl MiniPagination {
    /// Cursor on page 1; a page size of 0 is treated as 1
    #[must_use]
    pub fn new(len: usize, page_size: usize) -> Self {
        Self {
            len,
            page_size: page_size.max(1),
            page: 1,
        }
    }

    /// Current page
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Items per page
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of items being paged
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.len
    }

    /// `max(1, ceil(len / page_size))`
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        let pages = self.len.div_ceil(self.page_size);
        if pages == 0 { 1 } else { pages }
    }

    /// Jump to `page`, clamped into range
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    /// Next page, if any
    pub fn next(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    /// Previous page, if any
    pub fn prev(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// Whether a later page exists
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Whether an earlier page exists
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// The source changed length; keep the page if it still exists
    pub fn sync_len(&mut self, len: usize) {
        self.len = len;
        self.set_page(self.page);
    }

    /// Index range of the current page
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        let start = (self.page - 1).saturating_mul(self.page_size).min(self.len);
        let end = start.saturating_add(self.page_size).min(self.len);
        start..end
    }

    /// Items of the current page
    #[must_use]
    pub fn page_items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let end = range.end.min(items.len());
        items.get(range.start.min(end)..end).unwrap_or_default()
    }
}
