use serde::{Deserialize, Serialize};

// ============================================================================
// Pagination Vocabulary
// ============================================================================
//
// Pure helpers consumed by repositories. Included in the kernel because they
// share the outcome vocabulary every repository speaks.
//
// ============================================================================

/// Page request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        DEFAULT_PAGINATION
    }
}

/// First page, twenty items.
pub const DEFAULT_PAGINATION: PaginationParams = PaginationParams { page: 1, limit: 20 };

/// One page of results plus the navigation facts derived from the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Assemble a `PaginatedResult` from one page of items and the overall total.
pub fn create_paginated_result<T>(
    items: Vec<T>,
    params: PaginationParams,
    total: u64,
) -> PaginatedResult<T> {
    let limit = params.limit.max(1);
    let total_pages = (total.div_ceil(u64::from(limit))) as u32;

    PaginatedResult {
        items,
        total,
        page: params.page,
        limit,
        total_pages,
        has_next_page: params.page < total_pages,
        has_previous_page: params.page > 1,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_of_three_pages() {
        let result = create_paginated_result(
            vec!["a", "b", "c", "d", "e"],
            PaginationParams { page: 1, limit: 5 },
            15,
        );

        assert_eq!(result.total_pages, 3);
        assert!(result.has_next_page);
        assert!(!result.has_previous_page);
        assert_eq!(result.items.len(), 5);
    }

    #[test]
    fn test_last_page_has_no_next() {
        let result =
            create_paginated_result(vec![1, 2], PaginationParams { page: 3, limit: 5 }, 12);

        assert_eq!(result.total_pages, 3);
        assert!(!result.has_next_page);
        assert!(result.has_previous_page);
    }

    #[test]
    fn test_empty_result_set() {
        let result: PaginatedResult<i32> =
            create_paginated_result(vec![], PaginationParams::default(), 0);

        assert_eq!(result.total_pages, 0);
        assert!(!result.has_next_page);
        assert!(!result.has_previous_page);
        assert_eq!(result.page, 1);
        assert_eq!(result.limit, 20);
    }

    #[test]
    fn test_partial_final_page_rounds_up() {
        let result = create_paginated_result(vec![1], PaginationParams { page: 1, limit: 10 }, 11);
        assert_eq!(result.total_pages, 2);
    }

    #[test]
    fn test_default_pagination() {
        assert_eq!(DEFAULT_PAGINATION.page, 1);
        assert_eq!(DEFAULT_PAGINATION.limit, 20);
        assert_eq!(PaginationParams::default(), DEFAULT_PAGINATION);
    }
}
