//! Pagination request parameters and response metadata.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Maximum page size.
const MAX_LIMIT: u64 = 100;
/// Default page size.
const DEFAULT_LIMIT: u64 = 20;

/// Query parameters for paginated list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// Page number, 1-based (default: 1)
    pub page: Option<u64>,
    /// Items per page (default: 20, max: 100)
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Page number, clamped to at least 1.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to [1, MAX_LIMIT].
    pub fn clamped_limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Zero-based row offset for in-memory pagination. The page number
    /// comes straight off the query string, so the multiply saturates
    /// instead of overflowing on absurd values.
    pub fn offset(&self, limit: u64) -> usize {
        let offset = self.page().saturating_sub(1).saturating_mul(limit);
        usize::try_from(offset).unwrap_or(usize::MAX)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: None,
            limit: None,
        }
    }
}

/// Pagination metadata returned alongside list results.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(params: &PaginationParams, total: u64) -> Self {
        let limit = params.clamped_limit();
        Self {
            page: params.page(),
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let params = PaginationParams {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.clamped_limit(), 100);
    }

    #[test]
    fn offset_skips_earlier_pages() {
        let params = PaginationParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(params.offset(params.clamped_limit()), 40);
    }

    #[test]
    fn offset_saturates_on_huge_page_numbers() {
        let params = PaginationParams {
            page: Some(u64::MAX),
            limit: Some(100),
        };
        // an out-of-range page yields an empty slice, not a wraparound
        assert_eq!(params.offset(params.clamped_limit()), usize::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams {
            page: Some(1),
            limit: Some(20),
        };
        let p = Pagination::new(&params, 41);
        assert_eq!(p.total_pages, 3);
    }
}
