//! Pagination primitives shared by catalogue listings.
//!
//! The crate is pure: it never performs I/O and holds no hidden state. It
//! provides:
//!
//! - [`compute_window`], which maps a current page, a window size, and what is
//!   known about the dataset size to the page numbers a control should render
//! - [`PaginationState`], the caller-side view state (current page, page size,
//!   total count) with the display rules list views apply
//! - [`Paginated`], the list envelope returned by the catalogue API
//!
//! # Example
//!
//! ```
//! use pagination::{PageExtent, compute_window};
//!
//! let window = compute_window(5, 5, PageExtent::Known { total_pages: 10 });
//! assert_eq!(window.pages(), &[3, 4, 5, 6, 7]);
//! assert!(window.has_previous());
//! assert!(window.has_next());
//! ```

mod envelope;
mod state;
mod window;

pub use envelope::{PageLinkError, Paginated};
pub use state::{PaginationState, total_pages};
pub use window::{DEFAULT_WINDOW_SIZE, PageExtent, PageWindow, compute_window};
