//! Conversions between domain paging and SQL `LIMIT`/`OFFSET`.

use crate::domain::PageRequest;
use crate::domain::ports::RepositoryError;

/// `(limit, offset)` for a page request.
pub(crate) fn page_bounds(page: PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.limit()).unwrap_or(i64::MAX),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

/// Convert a `COUNT(*)` result.
pub(crate) fn row_count(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count).map_err(|err| RepositoryError::query(format!("negative row count: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_page_skips_two_pages() {
        assert_eq!(page_bounds(PageRequest::new(Some(3), Some(20))), (20, 40));
    }

    #[test]
    fn negative_counts_are_errors() {
        assert!(row_count(-1).is_err());
        assert_eq!(row_count(7), Ok(7));
    }
}
