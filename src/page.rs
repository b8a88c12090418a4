//! Pagination request and result.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Zero-based page index and page size, extractable from query params.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Result<Self, AppError> {
        PageRequest { page, size }.validated()
    }

    pub fn validated(self) -> Result<Self, AppError> {
        if self.size == 0 || self.size > MAX_PAGE_SIZE {
            return Err(AppError::invalid_argument(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        let fits = self
            .page
            .checked_mul(self.size)
            .is_some_and(|offset| offset <= i64::MAX as u64);
        if !fits {
            return Err(AppError::invalid_argument("page index out of range"));
        }
        Ok(self)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_elements.div_ceil(request.size)
        };
        Page {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_pages() {
        let req = PageRequest::new(2, 10).unwrap();
        assert_eq!(req.offset(), 20);
        let page = Page::new(vec![1, 2, 3], &req, 23);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.number_of_elements(), 3);
        assert_eq!(Page::<u8>::new(vec![], &req, 0).total_pages, 0);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(PageRequest::new(0, 0).is_err());
        assert!(PageRequest::new(0, MAX_PAGE_SIZE + 1).is_err());
        assert!(PageRequest::new(u64::MAX, 2).is_err());
    }

    #[test]
    fn query_defaults() {
        let req: PageRequest = serde_json::from_str(r#"{"page":3}"#).unwrap();
        assert_eq!(req, PageRequest { page: 3, size: DEFAULT_PAGE_SIZE });
    }
}
