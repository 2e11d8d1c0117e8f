//! Catalog service: books, authors, genres and the landing page counters

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tower_sessions::Session;
use validator::{Validate, ValidationErrors};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetails, AuthorForm},
        book::{Book, BookDetails, BookForm, BookShort},
        dashboard::DashboardCounts,
        field_error,
        genre::{CreateGenre, Genre},
        instance::LoanStatus,
        page::{Page, PageRequest},
        session::VisitCounter,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    page_size: i64,
}

impl CatalogService {
    pub fn new(repository: Repository, page_size: i64) -> Self {
        Self { repository, page_size }
    }

    /// Landing page counters. Counts this visit in the caller's session.
    pub async fn dashboard(&self, session: &Session) -> AppResult<DashboardCounts> {
        let num_books = self.repository.books.count().await?;
        let num_instances = self.repository.instances.count().await?;
        let num_instances_available = self
            .repository
            .instances
            .count_by_status(LoanStatus::Available)
            .await?;
        let num_authors = self.repository.authors.count().await?;
        let num_visits = VisitCounter::record_visit(session).await?;

        Ok(DashboardCounts {
            num_books,
            num_instances,
            num_instances_available,
            num_authors,
            num_visits,
        })
    }

    // Books

    pub async fn list_books(&self, page: Option<i64>) -> AppResult<Page<BookShort>> {
        let request = PageRequest::new(page, self.page_size)?;
        let (books, total) = self.repository.books.list(request).await?;
        Page::new(books, total, request)
    }

    /// Book with its genres and copies, overdue flags computed against `today`
    pub async fn get_book(&self, id: i32, today: NaiveDate) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let instances = self
            .repository
            .instances
            .list_by_book(id)
            .await?
            .into_iter()
            .map(|instance| instance.with_overdue_flag(today))
            .collect();

        Ok(BookDetails {
            display_genre: book.display_genre(),
            book,
            instances,
        })
    }

    pub async fn create_book(&self, form: BookForm) -> AppResult<Book> {
        let form = form.trimmed();
        self.check_book_form(&form).await?;
        let book = self.repository.books.create(&form).await?;
        tracing::info!(book_id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, form: BookForm) -> AppResult<Book> {
        let form = form.trimmed();
        self.check_book_form(&form).await?;
        self.repository.books.update(id, &form).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Field checks plus existence of the referenced author and genres
    async fn check_book_form(&self, form: &BookForm) -> AppResult<()> {
        let mut errors = match form.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let Some(author_id) = form.author_id {
            match self.repository.authors.get_by_id(author_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => errors.add(
                    "author_id",
                    field_error(
                        "invalid_choice",
                        format!("Select a valid choice. Author {} does not exist.", author_id),
                    ),
                ),
                Err(e) => return Err(e),
            }
        }

        let genre_ids: BTreeSet<i32> = form.genre_ids.iter().copied().collect();
        if !genre_ids.is_empty() {
            let ids: Vec<i32> = genre_ids.into_iter().collect();
            let existing = self.repository.genres.count_existing(&ids).await?;
            if existing != ids.len() as i64 {
                errors.add(
                    "genre_ids",
                    field_error("invalid_choice", "Select a valid choice. A genre does not exist."),
                );
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(errors))
        }
    }

    // Authors

    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<Page<Author>> {
        let request = PageRequest::new(page, self.page_size)?;
        let (authors, total) = self.repository.authors.list(request).await?;
        Page::new(authors, total, request)
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetails { author, books })
    }

    pub async fn create_author(&self, form: AuthorForm) -> AppResult<Author> {
        let form = form.trimmed();
        form.validate()?;
        let author = self.repository.authors.create(&form).await?;
        tracing::info!(author_id = author.id, author = %author, "Author created");
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, form: AuthorForm) -> AppResult<Author> {
        let form = form.trimmed();
        form.validate()?;
        self.repository.authors.update(id, &form).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }

    // Genres

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, data: CreateGenre) -> AppResult<Genre> {
        let data = CreateGenre {
            name: data.name.trim().to_string(),
        };
        data.validate()?;
        self.repository.genres.create(&data.name).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::*;

    use super::*;
    use crate::{
        models::{book::AuthorShort, instance::BookInstanceDetails, session::test_support::session_test_setup},
        repository::MockStores,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book_form(author_id: Option<i32>, genre_ids: Vec<i32>) -> BookForm {
        BookForm {
            title: "The Dispossessed".to_string(),
            summary: "Anarres and Urras".to_string(),
            isbn: "9780061054884".to_string(),
            author_id,
            genre_ids,
        }
    }

    fn author(id: i32) -> Author {
        Author {
            id,
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    fn book(id: i32, genres: Vec<Genre>) -> Book {
        Book {
            id,
            title: "The Dispossessed".to_string(),
            summary: "Anarres and Urras".to_string(),
            isbn: "9780061054884".to_string(),
            author: Some(AuthorShort {
                id: 1,
                first_name: "Ursula".to_string(),
                last_name: "Le Guin".to_string(),
            }),
            genres,
        }
    }

    #[tokio::test]
    async fn test_dashboard_counts_and_visits() {
        let mut stores = MockStores::default();
        stores.books.expect_count().returning(|| Ok(4));
        stores.instances.expect_count().returning(|| Ok(9));
        stores
            .instances
            .expect_count_by_status()
            .with(eq(LoanStatus::Available))
            .returning(|_| Ok(6));
        stores.authors.expect_count().returning(|| Ok(3));
        let service = CatalogService::new(stores.into_repository(), 10);
        let session = session_test_setup();

        let first = service.dashboard(&session).await.unwrap();
        assert_eq!(
            first,
            DashboardCounts {
                num_books: 4,
                num_instances: 9,
                num_instances_available: 6,
                num_authors: 3,
                num_visits: 0,
            }
        );

        let second = service.dashboard(&session).await.unwrap();
        assert_eq!(second.num_visits, 1);
    }

    #[tokio::test]
    async fn test_create_book_with_unknown_author_is_field_error() {
        let mut stores = MockStores::default();
        stores
            .authors
            .expect_get_by_id()
            .with(eq(42))
            .returning(|id| Err(AppError::NotFound(format!("Author with id {} not found", id))));
        stores.books.expect_create().never();
        let service = CatalogService::new(stores.into_repository(), 10);

        let result = service.create_book(book_form(Some(42), vec![])).await;
        match result {
            Err(AppError::InvalidFields(errors)) => {
                assert!(errors.field_errors().contains_key("author_id"))
            }
            other => panic!("expected field errors, got {:?}", other.map(|b| b.id)),
        }
    }

    #[tokio::test]
    async fn test_create_book_with_unknown_genre_is_field_error() {
        let mut stores = MockStores::default();
        stores
            .genres
            .expect_count_existing()
            .withf(|ids| ids == [1, 2])
            .returning(|_| Ok(1));
        stores.books.expect_create().never();
        let service = CatalogService::new(stores.into_repository(), 10);

        let result = service.create_book(book_form(None, vec![2, 1, 2])).await;
        assert!(matches!(result, Err(AppError::InvalidFields(_))));
    }

    #[tokio::test]
    async fn test_create_book_reports_every_invalid_field() {
        let stores = MockStores::default();
        let service = CatalogService::new(stores.into_repository(), 10);

        let mut form = book_form(None, vec![]);
        form.title = String::new();
        form.isbn = "123".to_string();
        match service.create_book(form).await {
            Err(AppError::InvalidFields(errors)) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("title"));
                assert!(fields.contains_key("isbn"));
            }
            _ => panic!("expected field errors"),
        }
    }

    #[tokio::test]
    async fn test_create_book_with_blank_text_is_field_error() {
        let mut stores = MockStores::default();
        stores.books.expect_create().never();
        let service = CatalogService::new(stores.into_repository(), 10);

        let mut form = book_form(None, vec![]);
        form.title = "   ".to_string();
        form.summary = " ".to_string();
        match service.create_book(form).await {
            Err(AppError::InvalidFields(errors)) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("title"));
                assert!(fields.contains_key("summary"));
                assert!(!fields.contains_key("isbn"));
            }
            _ => panic!("expected field errors"),
        }
    }

    #[tokio::test]
    async fn test_author_names_are_trimmed() {
        let mut stores = MockStores::default();
        stores
            .authors
            .expect_create()
            .withf(|form| form.first_name == "Ursula" && form.last_name == "Le Guin")
            .times(1)
            .returning(|_| Ok(author(1)));
        stores.authors.expect_update().never();
        let service = CatalogService::new(stores.into_repository(), 10);

        let padded = AuthorForm {
            first_name: " Ursula ".to_string(),
            last_name: "Le Guin\t".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        assert!(service.create_author(padded).await.is_ok());

        let blank = AuthorForm {
            first_name: "  ".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        match service.update_author(1, blank).await {
            Err(AppError::InvalidFields(errors)) => {
                assert!(errors.field_errors().contains_key("first_name"))
            }
            _ => panic!("expected a first_name field error"),
        }
    }

    #[tokio::test]
    async fn test_create_book() {
        let mut stores = MockStores::default();
        stores.authors.expect_get_by_id().returning(|id| Ok(author(id)));
        stores.genres.expect_count_existing().returning(|ids| Ok(ids.len() as i64));
        stores.books.expect_create().times(1).returning(|_| {
            Ok(book(
                5,
                vec![Genre {
                    id: 1,
                    name: "Science Fiction".to_string(),
                }],
            ))
        });
        let service = CatalogService::new(stores.into_repository(), 10);

        let created = service.create_book(book_form(Some(1), vec![1])).await.unwrap();
        assert_eq!(created.id, 5);
    }

    #[tokio::test]
    async fn test_get_book_flags_overdue_copies() {
        let mut stores = MockStores::default();
        stores.books.expect_get_by_id().returning(|id| {
            Ok(book(
                id,
                ["A", "B", "C", "D"]
                    .iter()
                    .enumerate()
                    .map(|(i, name)| Genre {
                        id: i as i32 + 1,
                        name: name.to_string(),
                    })
                    .collect(),
            ))
        });
        stores.instances.expect_list_by_book().returning(|book_id| {
            Ok(vec![BookInstanceDetails {
                id: uuid::Uuid::new_v4(),
                book_id: Some(book_id),
                book_title: Some("The Dispossessed".to_string()),
                due_back: Some(date(2024, 1, 1)),
                status: LoanStatus::OnLoan,
                borrower_id: Some(2),
                borrower_username: Some("shevek".to_string()),
                is_overdue: false,
            }])
        });
        let service = CatalogService::new(stores.into_repository(), 10);

        let details = service.get_book(5, date(2024, 2, 1)).await.unwrap();
        assert_eq!(details.display_genre, "A, B, C");
        assert!(details.instances[0].is_overdue);
    }

    #[tokio::test]
    async fn test_list_books_past_last_page() {
        let mut stores = MockStores::default();
        stores.books.expect_list().returning(|_| Ok((vec![], 12)));
        let service = CatalogService::new(stores.into_repository(), 10);

        assert!(service.list_books(Some(2)).await.is_ok());
        assert!(matches!(service.list_books(Some(3)).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_author_lists_books() {
        let mut stores = MockStores::default();
        stores.authors.expect_get_by_id().returning(|id| Ok(author(id)));
        stores.books.expect_list_by_author().with(eq(1)).returning(|author_id| {
            Ok(vec![BookShort {
                id: 5,
                title: "The Dispossessed".to_string(),
                author_id: Some(author_id),
                author_name: Some("Le Guin, Ursula".to_string()),
            }])
        });
        let service = CatalogService::new(stores.into_repository(), 10);

        let details = service.get_author(1).await.unwrap();
        assert_eq!(details.books.len(), 1);
    }

    #[tokio::test]
    async fn test_create_genre_rejects_empty_name() {
        let mut stores = MockStores::default();
        stores.genres.expect_create().never();
        let service = CatalogService::new(stores.into_repository(), 10);

        let result = service.create_genre(CreateGenre { name: "   ".to_string() }).await;
        assert!(matches!(result, Err(AppError::InvalidFields(_))));
    }
}
