//! Pagination arithmetic.

use serde::Serialize;

/// The slice of the processed row set shown on one page.
///
/// `start..end` indexes into the filtered, sorted rows. `page` is already
/// clamped to `1..=total_pages`, and an empty row set has one empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    /// Current page, 1-based.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Number of pages, at least 1.
    pub total_pages: usize,
    /// Number of rows across all pages.
    pub total_count: usize,
    /// Index of the first row on the page.
    pub start: usize,
    /// One past the index of the last row on the page.
    pub end: usize,
}

impl PageWindow {
    /// Returns the number of rows on this page.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the page has no rows.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if a later page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Returns `true` if an earlier page exists.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Returns this page's slice of `rows`.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let end = self.end.min(rows.len());
        &rows[self.start.min(end)..end]
    }
}

/// Returns the number of pages for `total` rows, at least 1.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Computes the window of `page` over `total` rows.
///
/// Out-of-range pages clamp rather than fail. A zero page size is treated as 1.
///
/// # Example
///
/// ```
/// use datagrid_lib::query::paginate;
///
/// let window = paginate(50, 2, 10);
/// assert_eq!((window.start, window.end), (10, 20));
///
/// let clamped = paginate(50, 99, 10);
/// assert_eq!(clamped.page, 5);
/// ```
pub fn paginate(total: usize, page: usize, page_size: usize) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = total_pages(total, page_size);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * page_size).min(total);
    let end = (start + page_size).min(total);
    PageWindow {
        page,
        page_size,
        total_pages,
        total_count: total,
        start,
        end,
    }
}
