//! Feed pagination: fixed page size, 1-based page numbers, clamping.

use serde::{Deserialize, Serialize};

/// Posts shown per feed page.
pub const POSTS_PER_PAGE: u64 = 10;

/// One page of a paginated result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served (after clamping).
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            number: 1,
            total_pages: 1,
            total_items: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

/// Clamp a requested 1-based page number into the valid range.
///
/// Requests below 1 serve page 1; requests past the end serve the last
/// page. An empty result set still has one (empty) page.
pub fn clamp_page(requested: u64, total_pages: u64) -> u64 {
    let last = total_pages.max(1);
    requested.clamp(1, last)
}

/// Parse the `page` query parameter. Missing or unparsable values
/// fall back to page 1.
pub fn parse_page_param(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.parse::<u64>().ok())
        .filter(|&p| p >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_valid_range() {
        assert_eq!(clamp_page(0, 5), 1);
        assert_eq!(clamp_page(3, 5), 3);
        assert_eq!(clamp_page(9, 5), 5);
        assert_eq!(clamp_page(1, 0), 1);
    }

    #[test]
    fn parses_page_param_with_fallback() {
        assert_eq!(parse_page_param(None), 1);
        assert_eq!(parse_page_param(Some("2")), 2);
        assert_eq!(parse_page_param(Some("0")), 1);
        assert_eq!(parse_page_param(Some("nope")), 1);
    }

    #[test]
    fn page_navigation_flags() {
        let page = Page {
            items: vec![1, 2, 3],
            number: 2,
            total_pages: 3,
            total_items: 23,
        };
        assert!(page.has_next());
        assert!(page.has_previous());
        assert!(!Page::<u32>::empty().has_next());
    }
}
