//! Page-number pagination primitives shared by feed and listing queries.
//!
//! Requests carry a 1-based page number taken from untrusted input. Parsing is
//! lenient: anything that is not a positive integer resolves to the first
//! page, so handlers never have to surface a pagination error. Responses are
//! wrapped in a [`Page`] envelope that reports whether a further page exists
//! and can render navigation links against a base URL.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Page size used when the caller does not configure one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a request may ask for.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Name of the query parameter carrying the page number.
pub const PAGE_QUERY_PARAM: &str = "page";

/// Errors raised when constructing a page request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// The page size falls outside `1..=MAX_PAGE_SIZE`.
    #[error("page size must be between 1 and {max}, got {actual}")]
    InvalidPageSize {
        /// Requested page size.
        actual: u32,
        /// Upper bound accepted by the request.
        max: u32,
    },
}

/// Parse a raw page parameter into a 1-based page number.
///
/// Missing, blank, non-numeric, zero, negative, and overflowing input all
/// resolve to page 1.
///
/// # Examples
///
/// ```
/// use pagination::parse_page_number;
///
/// assert_eq!(parse_page_number(Some("3")), 3);
/// assert_eq!(parse_page_number(Some("0")), 1);
/// assert_eq!(parse_page_number(Some("abc")), 1);
/// assert_eq!(parse_page_number(None), 1);
/// ```
#[must_use]
pub fn parse_page_number(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// A validated request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Build a request for `page`, clamping it to at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError::InvalidPageSize`] when `page_size` is zero
    /// or exceeds [`MAX_PAGE_SIZE`].
    pub fn new(page: u32, page_size: u32) -> Result<Self, PageRequestError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(PageRequestError::InvalidPageSize {
                actual: page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self {
            page: page.max(1),
            page_size,
        })
    }

    /// Build a request from a raw query parameter.
    ///
    /// # Errors
    ///
    /// Only the page size is validated; the raw page never causes an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::PageRequest;
    ///
    /// let request = PageRequest::parse(Some("not-a-number"), 20)?;
    /// assert_eq!(request.page(), 1);
    /// # Ok::<(), pagination::PageRequestError>(())
    /// ```
    pub fn parse(raw: Option<&str>, page_size: u32) -> Result<Self, PageRequestError> {
        Self::new(parse_page_number(raw), page_size)
    }

    /// Request the first page.
    ///
    /// # Errors
    ///
    /// See [`PageRequest::new`].
    pub fn first(page_size: u32) -> Result<Self, PageRequestError> {
        Self::new(1, page_size)
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip before this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)).saturating_mul(i64::from(self.page_size))
    }

    /// Number of rows to fetch so the caller can tell whether a next page
    /// exists without a separate count query.
    #[must_use]
    pub fn fetch_limit(&self) -> i64 {
        i64::from(self.page_size) + 1
    }

    /// Request for the following page.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            page_size: self.page_size,
        }
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    page: u32,
    page_size: u32,
    has_next: bool,
}

impl<T> Page<T> {
    /// Build a page from rows fetched with [`PageRequest::fetch_limit`].
    ///
    /// The extra row, when present, is dropped and recorded as `has_next`.
    #[must_use]
    pub fn from_overfetch(request: PageRequest, mut rows: Vec<T>) -> Self {
        let limit = usize::try_from(request.page_size()).unwrap_or(usize::MAX);
        let has_next = rows.len() > limit;
        rows.truncate(limit);
        Self {
            items: rows,
            page: request.page(),
            page_size: request.page_size(),
            has_next,
        }
    }

    /// Items on this page in query order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the envelope and return its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Configured page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Whether a further page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Whether the page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform each item while keeping the page metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            has_next: self.has_next,
        }
    }

    /// Render navigation links relative to `base`.
    ///
    /// Existing query parameters other than [`PAGE_QUERY_PARAM`] are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::{Page, PageRequest};
    /// use url::Url;
    ///
    /// let request = PageRequest::new(2, 2)?;
    /// let page = Page::from_overfetch(request, vec![1, 2, 3]);
    /// let base = Url::parse("https://kudoer.example/feed?view=all").expect("valid url");
    /// let links = page.links(&base);
    /// assert_eq!(links.next.expect("next").as_str(), "https://kudoer.example/feed?view=all&page=3");
    /// # Ok::<(), pagination::PageRequestError>(())
    /// ```
    #[must_use]
    pub fn links(&self, base: &Url) -> PageLinks {
        PageLinks {
            current: with_page(base, self.page),
            next: self
                .has_next
                .then(|| with_page(base, self.page.saturating_add(1))),
            prev: self
                .has_previous()
                .then(|| with_page(base, self.page.saturating_sub(1))),
        }
    }
}

/// Navigation links for a [`Page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    /// Link to the current page.
    pub current: Url,
    /// Link to the following page, when one exists.
    pub next: Option<Url>,
    /// Link to the preceding page, when one exists.
    pub prev: Option<Url>,
}

fn with_page(base: &Url, page: u32) -> Url {
    let mut url = base.clone();
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(PAGE_QUERY_PARAM, &page.to_string());
    url
}

#[cfg(test)]
mod tests {
    //! Unit tests for page parsing and the page envelope.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("1"), 1)]
    #[case(Some("7"), 7)]
    #[case(Some(" 4 "), 4)]
    #[case(Some("0"), 1)]
    #[case(Some("-2"), 1)]
    #[case(Some("two"), 1)]
    #[case(Some(""), 1)]
    #[case(Some("99999999999999999999"), 1)]
    #[case(None, 1)]
    fn page_numbers_fall_back_to_first_page(#[case] raw: Option<&str>, #[case] expected: u32) {
        assert_eq!(parse_page_number(raw), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_PAGE_SIZE + 1)]
    fn page_size_out_of_range_is_rejected(#[case] size: u32) {
        let err = PageRequest::new(1, size).expect_err("page size should be rejected");
        assert_eq!(
            err,
            PageRequestError::InvalidPageSize {
                actual: size,
                max: MAX_PAGE_SIZE
            }
        );
    }

    #[rstest]
    fn zero_page_is_clamped() {
        let request = PageRequest::new(0, 10).expect("valid size");
        assert_eq!(request.page(), 1);
        assert_eq!(request.offset(), 0);
    }

    #[rstest]
    #[case(1, 20, 0)]
    #[case(2, 20, 20)]
    #[case(5, 3, 12)]
    fn offset_skips_previous_pages(#[case] page: u32, #[case] size: u32, #[case] offset: i64) {
        let request = PageRequest::new(page, size).expect("valid size");
        assert_eq!(request.offset(), offset);
        assert_eq!(request.fetch_limit(), i64::from(size) + 1);
    }

    #[rstest]
    fn overfetched_row_marks_next_page() {
        let request = PageRequest::new(1, 3).expect("valid size");
        let page = Page::from_overfetch(request, vec!['a', 'b', 'c', 'd']);

        assert_eq!(page.items(), &['a', 'b', 'c']);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[rstest]
    fn short_page_has_no_next() {
        let request = PageRequest::new(3, 3).expect("valid size");
        let page = Page::from_overfetch(request, vec!['x']);

        assert_eq!(page.items(), &['x']);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[rstest]
    fn map_preserves_metadata() {
        let request = PageRequest::new(2, 2).expect("valid size");
        let page = Page::from_overfetch(request, vec![1, 2, 3]).map(|n| n * 10);

        assert_eq!(page.items(), &[10, 20]);
        assert_eq!(page.page(), 2);
        assert!(page.has_next());
    }

    #[rstest]
    fn links_replace_existing_page_parameter() {
        let request = PageRequest::new(2, 1).expect("valid size");
        let page = Page::from_overfetch(request, vec![1, 2]);
        let base = Url::parse("https://kudoer.example/?page=9&view=following").expect("url");

        let links = page.links(&base);

        assert_eq!(
            links.current.as_str(),
            "https://kudoer.example/?view=following&page=2"
        );
        assert_eq!(
            links.prev.expect("previous link").as_str(),
            "https://kudoer.example/?view=following&page=1"
        );
        assert_eq!(
            links.next.expect("next link").as_str(),
            "https://kudoer.example/?view=following&page=3"
        );
    }

    #[rstest]
    fn envelope_serialises_in_camel_case() {
        let request = PageRequest::new(1, 2).expect("valid size");
        let page = Page::from_overfetch(request, vec!["a"]);

        let value = serde_json::to_value(&page).expect("serialise page");

        assert_eq!(
            value,
            serde_json::json!({
                "items": ["a"],
                "page": 1,
                "pageSize": 2,
                "hasNext": false,
            })
        );
    }
}
