//! Data models for the catalog

pub mod author;
pub mod book;
pub mod dashboard;
pub mod genre;
pub mod instance;
pub mod page;
pub mod session;
pub mod user;

use std::borrow::Cow;

use validator::ValidationError;

// Re-export commonly used types
pub use author::{Author, AuthorDetails, AuthorForm};
pub use book::{Book, BookDetails, BookForm, BookShort};
pub use dashboard::DashboardCounts;
pub use genre::{CreateGenre, Genre};
pub use instance::{BookInstance, BookInstanceDetails, LoanStatus};
pub use page::{Page, PageQuery, PageRequest};
pub use user::{Permission, User, UserClaims};

/// Field-level validation error with a human readable message
pub(crate) fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}
