//! Sliding page-number window.
//!
//! A pagination control shows a bounded run of page buttons around the current
//! page. When the total page count is known the run is anchored to the first or
//! last page near the edges; when only a "more items exist" signal is
//! available the run trails the current page and peeks one page ahead.

/// Number of page buttons rendered when callers do not choose a size.
pub const DEFAULT_WINDOW_SIZE: u32 = 5;

/// What is known about the size of the paginated dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageExtent {
    /// The total number of pages is known.
    Known {
        /// Total number of pages; zero means the dataset is empty.
        total_pages: u32,
    },
    /// Only a signal telling whether items exist past the current page.
    Open {
        /// Whether at least one further page exists.
        has_more: bool,
    },
}

/// Page numbers to render plus previous/next availability.
///
/// ## Invariants
/// - `pages` is sorted ascending and holds no duplicates.
/// - `pages` contains the (clamped) current page unless the dataset is empty.
/// - With a known extent no page exceeds the total page count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageWindow {
    pages: Vec<u32>,
    has_previous: bool,
    has_next: bool,
}

impl PageWindow {
    /// Window reporting no pages and no navigation.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            pages: Vec::new(),
            has_previous: false,
            has_next: false,
        }
    }

    /// Page numbers to render, ascending.
    #[must_use]
    pub fn pages(&self) -> &[u32] {
        self.pages.as_slice()
    }

    /// Whether a "previous" control should be enabled.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Whether a "next" control should be enabled.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Whether the window holds no pages at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Lowest page in the window.
    #[must_use]
    pub fn first(&self) -> Option<u32> {
        self.pages.first().copied()
    }

    /// Highest page in the window.
    #[must_use]
    pub fn last(&self) -> Option<u32> {
        self.pages.last().copied()
    }

    /// Whether `page` is rendered by this window.
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.binary_search(&page).is_ok()
    }

    /// Whether pages exist before the window (an ellipsis belongs in front).
    #[must_use]
    pub fn starts_after_first_page(&self) -> bool {
        self.first().is_some_and(|page| page > 1)
    }

    /// Whether pages exist after the window given `total_pages`.
    #[must_use]
    pub fn ends_before(&self, total_pages: u32) -> bool {
        self.last().is_some_and(|page| page < total_pages)
    }
}

/// Compute the page numbers a pagination control should render.
///
/// Inputs are clamped rather than rejected: a zero `window_size` behaves as
/// one, a zero `current_page` as page one, and a page past a known end as the
/// last page. Even window sizes lean towards the start, holding one more page
/// before the current page than after it.
///
/// # Examples
///
/// ```
/// use pagination::{PageExtent, compute_window};
///
/// let first = compute_window(1, 5, PageExtent::Known { total_pages: 10 });
/// assert_eq!(first.pages(), &[1, 2, 3, 4, 5]);
/// assert!(!first.has_previous());
///
/// let open = compute_window(4, 5, PageExtent::Open { has_more: true });
/// assert_eq!(open.pages(), &[2, 3, 4, 5]);
/// assert!(open.has_next());
/// ```
#[must_use]
pub fn compute_window(current_page: u32, window_size: u32, extent: PageExtent) -> PageWindow {
    let size = window_size.max(1);
    let half = size.div_euclid(2);
    match extent {
        PageExtent::Known { total_pages } => known_window(current_page, size, half, total_pages),
        PageExtent::Open { has_more } => open_window(current_page, size, half, has_more),
    }
}

fn known_window(current_page: u32, size: u32, half: u32, total_pages: u32) -> PageWindow {
    if total_pages == 0 {
        return PageWindow::empty();
    }

    let current = current_page.clamp(1, total_pages);
    let (start, end) = if current <= half {
        (1, size.min(total_pages))
    } else if current > total_pages.saturating_sub(half) {
        let start = total_pages.saturating_sub(size).saturating_add(1).max(1);
        (start, total_pages)
    } else {
        let start = current.saturating_sub(half).max(1);
        let end = start.saturating_add(size - 1).min(total_pages);
        (start, end)
    };

    PageWindow {
        pages: (start..=end).collect(),
        has_previous: current > 1,
        has_next: current < total_pages,
    }
}

fn open_window(current_page: u32, size: u32, half: u32, has_more: bool) -> PageWindow {
    let current = current_page.max(1);
    let start = current.saturating_sub(half).max(1);
    let mut pages: Vec<u32> = (start..=current).collect();

    let filled = current - start + 1;
    if has_more && filled < size {
        if let Some(next) = current.checked_add(1) {
            pages.push(next);
        }
    }

    PageWindow {
        pages,
        has_previous: current > 1,
        has_next: has_more,
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn known(total_pages: u32) -> PageExtent {
        PageExtent::Known { total_pages }
    }

    #[rstest]
    #[case(1, 5, 10, &[1, 2, 3, 4, 5], false, true)]
    #[case(10, 5, 10, &[6, 7, 8, 9, 10], true, false)]
    #[case(5, 5, 10, &[3, 4, 5, 6, 7], true, true)]
    #[case(2, 5, 10, &[1, 2, 3, 4, 5], true, true)]
    #[case(9, 5, 10, &[6, 7, 8, 9, 10], true, true)]
    #[case(3, 5, 10, &[1, 2, 3, 4, 5], true, true)]
    #[case(8, 5, 10, &[6, 7, 8, 9, 10], true, true)]
    #[case(2, 5, 3, &[1, 2, 3], true, true)]
    #[case(3, 5, 3, &[1, 2, 3], true, false)]
    #[case(1, 5, 1, &[1], false, false)]
    fn known_extent_windows(
        #[case] current_page: u32,
        #[case] window_size: u32,
        #[case] total_pages: u32,
        #[case] expected: &[u32],
        #[case] has_previous: bool,
        #[case] has_next: bool,
    ) {
        let window = compute_window(current_page, window_size, known(total_pages));
        assert_eq!(window.pages(), expected);
        assert_eq!(window.has_previous(), has_previous);
        assert_eq!(window.has_next(), has_next);
    }

    #[rstest]
    fn empty_dataset_reports_no_pages() {
        let window = compute_window(1, 5, known(0));
        assert!(window.is_empty());
        assert!(!window.has_previous());
        assert!(!window.has_next());
    }

    #[rstest]
    #[case(0, 1)]
    #[case(42, 10)]
    fn out_of_range_pages_are_clamped(#[case] current_page: u32, #[case] clamped: u32) {
        let window = compute_window(current_page, 5, known(10));
        assert!(window.contains(clamped));
        assert!(window.pages().iter().all(|page| (1..=10).contains(page)));
    }

    #[rstest]
    #[case(5, &[3, 4, 5, 6])]
    #[case(1, &[1, 2, 3, 4])]
    #[case(10, &[7, 8, 9, 10])]
    #[case(9, &[7, 8, 9, 10])]
    fn even_window_sizes_lean_towards_the_start(#[case] current_page: u32, #[case] expected: &[u32]) {
        let window = compute_window(current_page, 4, known(10));
        assert_eq!(window.pages(), expected);
    }

    #[rstest]
    fn zero_window_size_behaves_as_one() {
        let window = compute_window(4, 0, known(10));
        assert_eq!(window.pages(), &[4]);
    }

    #[rstest]
    #[case(1, false, &[1], false)]
    #[case(1, true, &[1, 2], false)]
    #[case(4, true, &[2, 3, 4, 5], true)]
    #[case(4, false, &[2, 3, 4], true)]
    #[case(2, true, &[1, 2, 3], true)]
    fn open_extent_windows(
        #[case] current_page: u32,
        #[case] has_more: bool,
        #[case] expected: &[u32],
        #[case] has_previous: bool,
    ) {
        let window = compute_window(current_page, 5, PageExtent::Open { has_more });
        assert_eq!(window.pages(), expected);
        assert_eq!(window.has_previous(), has_previous);
        assert_eq!(window.has_next(), has_more);
    }

    #[rstest]
    fn open_window_never_exceeds_window_size() {
        let window = compute_window(7, 2, PageExtent::Open { has_more: true });
        assert_eq!(window.pages(), &[6, 7]);
        assert!(window.has_next());
    }

    #[rstest]
    fn windows_hold_the_current_page_without_duplicates() {
        for total_pages in 1..=12 {
            for window_size in 1..=7 {
                for current_page in 1..=total_pages {
                    let window = compute_window(current_page, window_size, known(total_pages));
                    assert!(window.contains(current_page));
                    assert!(
                        window
                            .pages()
                            .windows(2)
                            .all(|pair| matches!(pair, [a, b] if a < b))
                    );
                    let len = u32::try_from(window.pages().len()).unwrap_or(u32::MAX);
                    assert!(len <= window_size.min(total_pages));
                }
            }
        }
    }

    #[rstest]
    fn identical_inputs_produce_identical_windows() {
        let first = compute_window(6, 5, known(20));
        let second = compute_window(6, 5, known(20));
        assert_eq!(first, second);
    }

    #[rstest]
    fn ellipsis_hints_follow_window_edges() {
        let window = compute_window(5, 5, known(10));
        assert!(window.starts_after_first_page());
        assert!(window.ends_before(10));

        let start = compute_window(1, 5, known(10));
        assert!(!start.starts_after_first_page());
    }
}
