//! Pagination of list endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{author::Author, book::BookShort, instance::BookInstanceDetails},
};

/// `?page=N` query parameter (1-based)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// A page number resolved against the configured page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: i64) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::NotFound(format!("Invalid page ({}): page number is less than 1", page)));
        }
        // An offset that does not fit is necessarily past the last row
        if (page - 1).checked_mul(per_page).is_none() {
            return Err(AppError::NotFound(format!(
                "Invalid page ({}): that page contains no results",
                page
            )));
        }
        Ok(Self { page, per_page })
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// One page of a paginated listing
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    AuthorPage = Page<Author>,
    BookPage = Page<BookShort>,
    InstancePage = Page<BookInstanceDetails>
)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub items: Vec<T>,
    /// Total number of records across all pages
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Builds the page, rejecting page numbers past the end.
    ///
    /// The first page always exists, even for an empty listing.
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> AppResult<Self> {
        let num_pages = num_pages(total, request.per_page);
        if request.page > num_pages.max(1) {
            return Err(AppError::NotFound(format!(
                "Invalid page ({}): that page contains no results",
                request.page
            )));
        }

        Ok(Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            num_pages,
        })
    }
}

fn num_pages(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::genre::Genre;

    fn genre(id: i32) -> Genre {
        Genre {
            id,
            name: format!("genre {}", id),
        }
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::new(Some(3), 10).unwrap();
        assert_eq!(request.offset(), 20);
        assert_eq!(request.limit(), 10);
        assert_eq!(PageRequest::new(None, 10).unwrap().offset(), 0);
    }

    #[test]
    fn test_page_below_one_is_not_found() {
        assert!(matches!(PageRequest::new(Some(0), 10), Err(AppError::NotFound(_))));
        assert!(matches!(PageRequest::new(Some(-2), 10), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_page_with_overflowing_offset_is_not_found() {
        assert!(matches!(PageRequest::new(Some(i64::MAX), 10), Err(AppError::NotFound(_))));

        let last = i64::MAX / 10 + 1;
        let request = PageRequest::new(Some(last), 10).unwrap();
        assert_eq!(request.offset(), (last - 1) * 10);
    }

    #[test]
    fn test_num_pages() {
        assert_eq!(num_pages(0, 10), 0);
        assert_eq!(num_pages(10, 10), 1);
        assert_eq!(num_pages(11, 10), 2);
    }

    #[test]
    fn test_empty_first_page_is_allowed() {
        let page = Page::<Genre>::new(vec![], 0, PageRequest::new(Some(1), 10).unwrap()).unwrap();
        assert_eq!(page.num_pages, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_page_past_end_is_not_found() {
        let request = PageRequest::new(Some(3), 10).unwrap();
        let result = Page::new(vec![genre(1)], 15, request);
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let request = PageRequest::new(Some(2), 10).unwrap();
        let page = Page::new(vec![genre(11)], 11, request).unwrap();
        assert_eq!(page.num_pages, 2);
    }
}
