//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{genre::Genre, instance::BookInstanceDetails};

/// Number of genres shown by [`display_genres`]
pub const DISPLAYED_GENRES: usize = 3;

/// Joins the first `limit` genre names with ", ", in stored order.
pub fn display_genres(genres: &[Genre], limit: usize) -> String {
    genres
        .iter()
        .take(limit)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Author reference embedded in a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuthorShort {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

/// Full book model, with author and genres resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    /// None once the author has been deleted
    pub author: Option<AuthorShort>,
    /// Genres in the order they were attached
    pub genres: Vec<Genre>,
}

impl Book {
    pub fn display_genre(&self) -> String {
        display_genres(&self.genres, DISPLAYED_GENRES)
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Book detail response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub display_genre: String,
    pub instances: Vec<BookInstanceDetails>,
}

/// Short book representation for lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    /// "last, first" of the author, if any
    pub author_name: Option<String>,
}

/// Create or update book request
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1 to 1000 characters"))]
    pub summary: String,
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    pub author_id: Option<i32>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

impl BookForm {
    /// Strips surrounding whitespace from the text fields
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres(names: &[&str]) -> Vec<Genre> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Genre {
                id: i as i32 + 1,
                name: name.to_string(),
            })
            .collect()
    }

    fn form(isbn: &str) -> BookForm {
        BookForm {
            title: "Dune".to_string(),
            summary: "Spice".to_string(),
            isbn: isbn.to_string(),
            author_id: None,
            genre_ids: vec![],
        }
    }

    #[test]
    fn test_display_genres_empty() {
        assert_eq!(display_genres(&[], DISPLAYED_GENRES), "");
    }

    #[test]
    fn test_display_genres_keeps_order() {
        let genres = genres(&["Science Fiction", "Adventure"]);
        assert_eq!(display_genres(&genres, DISPLAYED_GENRES), "Science Fiction, Adventure");
    }

    #[test]
    fn test_display_genres_truncates_to_limit() {
        let book = Book {
            id: 1,
            title: "Dune".to_string(),
            summary: String::new(),
            isbn: "9780441172719".to_string(),
            author: None,
            genres: genres(&["A", "B", "C", "D", "E"]),
        };
        assert_eq!(book.display_genre(), "A, B, C");
    }

    #[test]
    fn test_isbn_must_be_thirteen_chars() {
        assert!(form("9780441172719").validate().is_ok());

        let errors = form("978044117271").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("isbn"));
        assert!(form("97804411727190").validate().is_err());
    }

    #[test]
    fn test_blank_fields_fail_once_trimmed() {
        let blank = BookForm {
            title: "   ".to_string(),
            summary: " \n".to_string(),
            isbn: " 9780441172719 ".to_string(),
            author_id: None,
            genre_ids: vec![],
        }
        .trimmed();

        assert_eq!(blank.isbn, "9780441172719");
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("summary"));
        assert!(!errors.field_errors().contains_key("isbn"));
    }

    #[test]
    fn test_title_required() {
        let mut f = form("9780441172719");
        f.title = String::new();
        let errors = f.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }
}
