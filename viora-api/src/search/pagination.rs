use serde::Serialize;

/// Validated page request. `page` starts at 1, `limit` is already clamped to
/// the configured maximum by the parameter layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: i64,
}

impl PageRequest {
    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.limit as u64
    }
}

/// Metadata every list response carries alongside its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: i64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(request.limit as u64);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(page: u64, limit: i64, total: u64) -> PageMeta {
        PageMeta::new(PageRequest { page, limit }, total)
    }

    #[test]
    fn skip_is_zero_based() {
        assert_eq!(PageRequest { page: 1, limit: 20 }.skip(), 0);
        assert_eq!(PageRequest { page: 3, limit: 20 }.skip(), 40);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(meta(1, 20, 0).total_pages, 0);
        assert_eq!(meta(1, 20, 1).total_pages, 1);
        assert_eq!(meta(1, 20, 20).total_pages, 1);
        assert_eq!(meta(1, 20, 21).total_pages, 2);
    }

    #[test]
    fn has_next_page_iff_items_remain() {
        assert!(meta(1, 20, 41).has_next_page);
        assert!(meta(2, 20, 41).has_next_page);
        assert!(!meta(3, 20, 41).has_next_page);
        assert!(!meta(1, 20, 20).has_next_page);
        assert!(!meta(1, 20, 0).has_next_page);
    }

    #[test]
    fn has_prev_page_only_after_first() {
        assert!(!meta(1, 20, 100).has_prev_page);
        assert!(meta(2, 20, 100).has_prev_page);
        // Even past the end, prev still points somewhere real.
        assert!(meta(9, 20, 41).has_prev_page);
        assert!(!meta(9, 20, 41).has_next_page);
    }
}
