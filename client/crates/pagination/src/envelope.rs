//! Page-number list envelope returned by catalogue list endpoints.
//!
//! The envelope carries the total item count plus absolute (or relative)
//! links to the neighbouring pages. Page numbers travel in the `page` query
//! parameter; the link to the first page usually omits it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::state::PaginationState;

const PAGE_QUERY_KEY: &str = "page";
const RELATIVE_LINK_BASE: &str = "http://relative.invalid/";

/// Errors raised while decoding page links.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageLinkError {
    /// The link is not a valid absolute or relative URL.
    #[error("malformed page link '{link}': {message}")]
    Malformed {
        /// Link as received.
        link: String,
        /// Parser failure description.
        message: String,
    },
    /// The `page` query parameter is not a positive integer.
    #[error("invalid page number '{value}' in page link")]
    InvalidPageNumber {
        /// Raw parameter value.
        value: String,
    },
}

/// One page of results plus navigation links.
///
/// # Examples
///
/// ```
/// use pagination::Paginated;
///
/// let page: Paginated<String> = serde_json::from_str(
///     r#"{
///         "count": 23,
///         "next": "https://api.example.test/api/books/?page=3",
///         "previous": "https://api.example.test/api/books/",
///         "results": ["a", "b"]
///     }"#,
/// )
/// .expect("valid envelope");
/// assert_eq!(page.next_page(), Ok(Some(3)));
/// assert_eq!(page.previous_page(), Ok(Some(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Total number of items across all pages.
    pub count: u64,
    /// Link to the next page, if any.
    pub next: Option<String>,
    /// Link to the previous page, if any.
    pub previous: Option<String>,
    /// Items on this page.
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Whether a further page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Page number referenced by the `next` link.
    ///
    /// # Errors
    ///
    /// Returns [`PageLinkError`] when the link cannot be decoded.
    pub fn next_page(&self) -> Result<Option<u32>, PageLinkError> {
        self.next.as_deref().map(page_from_link).transpose()
    }

    /// Page number referenced by the `previous` link.
    ///
    /// # Errors
    ///
    /// Returns [`PageLinkError`] when the link cannot be decoded.
    pub fn previous_page(&self) -> Result<Option<u32>, PageLinkError> {
        self.previous.as_deref().map(page_from_link).transpose()
    }

    /// View state for this page when the view is on `current_page`.
    ///
    /// The page size is inferred from the results when `current_page` is the
    /// first page and `page_size` is `None`.
    #[must_use]
    pub fn pagination_state(&self, current_page: u32, page_size: Option<u32>) -> PaginationState {
        let mut state = PaginationState::new(current_page)
            .with_page_size(page_size)
            .with_total_count(Some(self.count))
            .with_has_more(self.has_next());
        state.infer_page_size(self.results.len());
        state
    }
}

fn page_from_link(link: &str) -> Result<u32, PageLinkError> {
    let url = parse_link(link)?;
    let Some(raw) = url
        .query_pairs()
        .find(|(key, _)| key == PAGE_QUERY_KEY)
        .map(|(_, value)| value.into_owned())
    else {
        return Ok(1);
    };

    match raw.parse::<u32>() {
        Ok(page) if page > 0 => Ok(page),
        _ => Err(PageLinkError::InvalidPageNumber { value: raw }),
    }
}

fn parse_link(link: &str) -> Result<Url, PageLinkError> {
    let malformed = |err: url::ParseError| PageLinkError::Malformed {
        link: link.to_owned(),
        message: err.to_string(),
    };
    match Url::parse(link) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_LINK_BASE)
            .and_then(|base| base.join(link))
            .map_err(malformed),
        Err(err) => Err(malformed(err)),
    }
}
