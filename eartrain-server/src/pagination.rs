//! Pagination for list endpoints

use serde::{Deserialize, Serialize};

/// Default rows per page
pub const PAGE_SIZE: i64 = 20;

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?page=&per_page=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Where a page sits in the full result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// 1-indexed, clamped to [1, total_pages]
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    /// SQL OFFSET for this page
    #[serde(skip)]
    pub offset: i64,
}

impl PageQuery {
    pub fn paginate(&self, total: i64) -> Pagination {
        calculate_pagination(
            total,
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(PAGE_SIZE),
        )
    }
}

/// Calculate pagination metadata from total results and requested page
///
/// # Examples
/// ```
/// use eartrain_server::pagination::calculate_pagination;
///
/// // 50 users at 20 per page = 3 pages (20 + 20 + 10)
/// let p = calculate_pagination(50, 2, 20);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 20);
///
/// // out-of-range pages are clamped
/// let p = calculate_pagination(50, 99, 20);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 40);
/// ```
pub fn calculate_pagination(total: i64, requested_page: i64, per_page: i64) -> Pagination {
    let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
    let total = total.max(0);
    let total_pages = (total + per_page - 1) / per_page;
    let page = requested_page.clamp(1, total_pages.max(1));

    Pagination {
        page,
        per_page,
        total,
        total_pages,
        offset: (page - 1) * per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_middle_page() {
        let p = calculate_pagination(65, 2, PAGE_SIZE);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 4);
        assert_eq!(p.offset, 20);
    }

    #[test]
    fn test_pagination_out_of_bounds() {
        let high = calculate_pagination(30, 99, PAGE_SIZE);
        assert_eq!(high.page, 2);
        assert_eq!(high.offset, 20);

        let low = calculate_pagination(30, -3, PAGE_SIZE);
        assert_eq!(low.page, 1);
        assert_eq!(low.offset, 0);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1, PAGE_SIZE);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_per_page_clamped() {
        assert_eq!(calculate_pagination(500, 1, 0).per_page, 1);
        assert_eq!(calculate_pagination(500, 1, 1000).per_page, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_query_defaults() {
        let p = PageQuery::default().paginate(45);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, PAGE_SIZE);
        assert_eq!(p.total_pages, 3);
    }
}
