//! Page windows over filtered record sets

use thiserror::Error;

/// Page used when the request does not specify one
pub const DEFAULT_PAGE: usize = 1;

/// Largest accepted page size, also the default
pub const MAX_PAGE_SIZE: usize = 50_000;

/// Errors for page parameters outside their accepted range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page must be at least 1, got {0}")]
    InvalidPage(usize),

    #[error("page_size must be between 1 and {max}, got {0}", max = MAX_PAGE_SIZE)]
    InvalidPageSize(usize),
}

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Validates `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE`
    pub fn new(page: usize, page_size: usize) -> Result<Self, PageError> {
        if page < 1 {
            return Err(PageError::InvalidPage(page));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(PageError::InvalidPageSize(page_size));
        }

        Ok(Self { page, page_size })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: MAX_PAGE_SIZE,
        }
    }
}

/// One window of a record set plus totals for the whole set
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slices `records[(page-1)*page_size .. page*page_size]`
///
/// Bounds are not clamped here: a window past the end, a zero page or a
/// zero page size all yield an empty slice rather than an error.
pub fn paginate<T>(records: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let total_items = records.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    };

    let items = page
        .checked_sub(1)
        .and_then(|index| index.checked_mul(page_size))
        .filter(|&start| start < total_items)
        .map(|start| {
            let end = start.saturating_add(page_size).min(total_items);
            &records[start..end]
        })
        .unwrap_or(&[]);

    Page {
        items,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_second_page_of_twenty_five() {
        let records = numbers(25);
        let page = paginate(&records, 2, 10);

        assert_eq!(page.items, &records[10..20]);
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_last_page_is_partial() {
        let records = numbers(25);
        let page = paginate(&records, 3, 10);

        assert_eq!(page.items, &records[20..25]);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let records = numbers(5);
        let page = paginate(&records, 100, 10);

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_empty_record_set_has_no_pages() {
        let records: Vec<usize> = Vec::new();
        let page = paginate(&records, 1, 10);

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let records = numbers(20);
        assert_eq!(paginate(&records, 1, 10).total_pages, 2);
        assert!(paginate(&records, 3, 10).items.is_empty());
    }

    #[test]
    fn test_unvalidated_inputs_do_not_panic() {
        let records = numbers(5);

        assert!(paginate(&records, 0, 10).items.is_empty());
        assert!(paginate(&records, 1, 0).items.is_empty());
        assert_eq!(paginate(&records, 1, 0).total_pages, 0);
        assert!(paginate(&records, usize::MAX, usize::MAX).items.is_empty());
    }

    #[test]
    fn test_page_request_validation() {
        assert_eq!(
            PageRequest::new(1, 50),
            Ok(PageRequest { page: 1, page_size: 50 })
        );
        assert_eq!(PageRequest::new(0, 50), Err(PageError::InvalidPage(0)));
        assert_eq!(PageRequest::new(1, 0), Err(PageError::InvalidPageSize(0)));
        assert_eq!(
            PageRequest::new(1, MAX_PAGE_SIZE + 1),
            Err(PageError::InvalidPageSize(MAX_PAGE_SIZE + 1))
        );
        assert!(PageRequest::new(7, MAX_PAGE_SIZE).is_ok());
    }

    #[test]
    fn test_page_request_default() {
        let request = PageRequest::default();
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 50_000);
    }

    #[test]
    fn test_page_error_messages() {
        assert_eq!(
            PageError::InvalidPageSize(0).to_string(),
            "page_size must be between 1 and 50000, got 0"
        );
        assert_eq!(PageError::InvalidPage(0).to_string(), "page must be at least 1, got 0");
    }
}
