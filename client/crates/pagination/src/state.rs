//! Caller-side pagination view state.

use crate::window::{DEFAULT_WINDOW_SIZE, PageExtent, PageWindow, compute_window};

/// Number of pages needed to hold `total_count` items at `page_size` per page.
///
/// Returns `None` when the page size is zero, since the page count is then
/// unknown rather than infinite.
///
/// # Examples
///
/// ```
/// use pagination::total_pages;
///
/// assert_eq!(total_pages(23, 10), Some(3));
/// assert_eq!(total_pages(0, 10), Some(0));
/// assert_eq!(total_pages(23, 0), None);
/// ```
#[must_use]
pub fn total_pages(total_count: u64, page_size: u32) -> Option<u32> {
    if page_size == 0 {
        return None;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    Some(u32::try_from(pages).unwrap_or(u32::MAX))
}

/// Pagination state held by a list view.
///
/// Only the current page is required. Page size and total count are often
/// unknown until the first page arrives; until both are known the state falls
/// back to the "more items exist" signal from the list envelope.
///
/// # Examples
///
/// ```
/// use pagination::PaginationState;
///
/// let state = PaginationState::new(2)
///     .with_page_size(Some(10))
///     .with_total_count(Some(95));
/// assert_eq!(state.total_pages(), Some(10));
/// assert_eq!(state.window().pages(), &[1, 2, 3, 4, 5]);
/// assert!(state.is_visible());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    current_page: u32,
    page_size: Option<u32>,
    total_count: Option<u64>,
    has_more: bool,
    window_size: u32,
}

impl PaginationState {
    /// State positioned on `current_page` with nothing else known.
    #[must_use]
    pub const fn new(current_page: u32) -> Self {
        Self {
            current_page,
            page_size: None,
            total_count: None,
            has_more: false,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    /// Set the number of items per page, if known.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the total number of items, if known.
    #[must_use]
    pub const fn with_total_count(mut self, total_count: Option<u64>) -> Self {
        self.total_count = total_count;
        self
    }

    /// Record whether further items exist past the current page.
    #[must_use]
    pub const fn with_has_more(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }

    /// Override the number of page buttons rendered.
    #[must_use]
    pub const fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size;
        self
    }

    /// Page the view asked for, before clamping.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Items per page, if known.
    #[must_use]
    pub const fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    /// Total item count, if known.
    #[must_use]
    pub const fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Adopt the length of the first page as the page size.
    ///
    /// Only applies on page one, when no page size is known yet and the page
    /// holds at least one item; later pages may be short and are ignored.
    pub fn infer_page_size(&mut self, first_page_len: usize) {
        if self.current_page <= 1 && self.page_size.is_none() && first_page_len > 0 {
            self.page_size = u32::try_from(first_page_len).ok();
        }
    }

    /// Total number of pages when both count and page size are known.
    #[must_use]
    pub fn total_pages(&self) -> Option<u32> {
        let count = self.total_count?;
        let size = self.page_size?;
        total_pages(count, size)
    }

    /// Dataset extent derived from what is currently known.
    #[must_use]
    pub fn extent(&self) -> PageExtent {
        self.total_pages().map_or(
            PageExtent::Open {
                has_more: self.has_more,
            },
            |total_pages| PageExtent::Known { total_pages },
        )
    }

    /// Current page clamped to `[1, max(1, total_pages)]`.
    #[must_use]
    pub fn clamped_page(&self) -> u32 {
        let page = self.current_page.max(1);
        self.total_pages()
            .map_or(page, |total_pages| page.min(total_pages.max(1)))
    }

    /// Whether a page after the current one exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        match self.extent() {
            PageExtent::Known { total_pages } => self.clamped_page() < total_pages,
            PageExtent::Open { has_more } => has_more,
        }
    }

    /// Whether the control should be shown at all.
    ///
    /// A single page with nothing after it needs no pagination control.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        let single_page = self
            .total_pages()
            .is_none_or(|total_pages| total_pages <= 1);
        !(self.clamped_page() == 1 && !self.has_next() && single_page)
    }

    /// Page numbers and navigation flags for the current state.
    #[must_use]
    pub fn window(&self) -> PageWindow {
        compute_window(self.clamped_page(), self.window_size, self.extent())
    }
}
