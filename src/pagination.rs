//! Client-side paging of the job table.

/// 1-indexed page window over the synchronized job list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationView {
    page_size: usize,
    page: usize,
}

impl PaginationView {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// An empty collection still has one (empty) page.
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Move to `page` if it exists for a collection of `total` items.
    pub fn go_to(&mut self, page: usize, total: usize) -> bool {
        if page == 0 || page > self.total_pages(total) {
            return false;
        }
        self.page = page;
        true
    }

    /// Keep the current page across a refresh unless it no longer exists.
    pub fn reconcile(&mut self, total: usize) {
        let last = self.total_pages(total);
        if self.page > last {
            self.page = last;
        }
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.page_size).min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}
