//! Pagination over a total item count.

use crate::sql::Limit;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub item_count: i64,
    pub page_index: i64,
    pub page_size: i64,
    pub page_count: i64,
    pub offset: i64,
    pub limit: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Page {
    pub fn new(item_count: i64, page_index: i64) -> Self {
        Self::with_size(item_count, page_index, DEFAULT_PAGE_SIZE)
    }

    /// An index past the last page, or an empty result, resets to page 1 with nothing to fetch.
    pub fn with_size(item_count: i64, page_index: i64, page_size: i64) -> Self {
        let page_size = page_size.max(1);
        let item_count = item_count.max(0);
        let page_count = (item_count + page_size - 1) / page_size;
        let (page_index, offset, limit) = if item_count == 0 || page_index > page_count {
            (1, 0, 0)
        } else {
            (page_index, page_size * (page_index - 1), page_size)
        };
        Page {
            item_count,
            page_index,
            page_size,
            page_count,
            offset,
            limit,
            has_next: page_index < page_count,
            has_previous: page_index > 1,
        }
    }

    pub fn query_limit(&self) -> Limit {
        Limit::Range {
            offset: self.offset,
            count: self.limit,
        }
    }
}

/// Page index from a query value; anything unparsable or below 1 is page 1.
pub fn page_index_from(s: &str) -> i64 {
    s.trim().parse::<i64>().ok().filter(|p| *p >= 1).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_clamps() {
        assert_eq!(page_index_from("3"), 3);
        assert_eq!(page_index_from("0"), 1);
        assert_eq!(page_index_from("-2"), 1);
        assert_eq!(page_index_from("abc"), 1);
    }

    #[test]
    fn middle_page() {
        let p = Page::new(91, 3);
        assert_eq!(p.page_count, 10);
        assert_eq!(p.offset, 20);
        assert_eq!(p.limit, 10);
        assert!(p.has_next);
        assert!(p.has_previous);
        assert_eq!(p.query_limit(), Limit::Range { offset: 20, count: 10 });
    }

    #[test]
    fn empty_and_overflowing_pages_reset() {
        let p = Page::new(0, 1);
        assert_eq!((p.page_index, p.page_count, p.limit), (1, 0, 0));
        assert!(!p.has_next);

        let p = Page::new(15, 7);
        assert_eq!((p.page_index, p.offset, p.limit), (1, 0, 0));
        assert!(p.has_next);
    }
}
