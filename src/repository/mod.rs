//! Repository layer for database operations
//!
//! Each store is a trait so services can run against the PostgreSQL
//! implementations in production and against mocks in tests. Referential
//! actions (set-null on author, book and user deletion) are enforced by the
//! schema, not by these stores.

pub mod authors;
pub mod books;
pub mod genres;
pub mod instances;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorForm},
        book::{Book, BookForm, BookShort},
        genre::Genre,
        instance::{BookInstance, BookInstanceDetails, CreateInstance, LoanStatus, UpdateInstance},
        page::PageRequest,
        user::{Permission, User},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenresStore: Send + Sync {
    /// All genres ordered by name
    async fn list(&self) -> AppResult<Vec<Genre>>;

    async fn create(&self, name: &str) -> AppResult<Genre>;

    /// Fails with Conflict while a book still uses the genre
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Number of the given ids that exist
    async fn count_existing(&self, ids: &[i32]) -> AppResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorsStore: Send + Sync {
    /// Page of authors ordered by last name, with the total count
    async fn list(&self, page: PageRequest) -> AppResult<(Vec<Author>, i64)>;

    async fn get_by_id(&self, id: i32) -> AppResult<Author>;

    async fn create(&self, form: &AuthorForm) -> AppResult<Author>;

    async fn update(&self, id: i32, form: &AuthorForm) -> AppResult<Author>;

    /// Books of the author keep existing with a null author
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    /// Page of books ordered by title, with the total count
    async fn list(&self, page: PageRequest) -> AppResult<(Vec<BookShort>, i64)>;

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>>;

    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    async fn create(&self, form: &BookForm) -> AppResult<Book>;

    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book>;

    /// Instances of the book keep existing with a null book
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstancesStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstanceDetails>;

    async fn list_by_book(&self, book_id: i32) -> AppResult<Vec<BookInstanceDetails>>;

    /// Page of a borrower's instances by due date, unset due dates last
    async fn list_by_borrower(
        &self,
        borrower_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)>;

    /// Page of instances on loan by due date, unset due dates last
    async fn list_on_loan(&self, page: PageRequest) -> AppResult<(Vec<BookInstanceDetails>, i64)>;

    async fn create(&self, id: Uuid, data: &CreateInstance) -> AppResult<BookInstance>;

    async fn update(&self, id: Uuid, data: &UpdateInstance) -> AppResult<BookInstance>;

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<User>;

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn username_exists(&self, username: &str) -> AppResult<bool>;

    /// `password` is the argon2 hash
    async fn create(&self, username: &str, password: &str, is_superuser: bool) -> AppResult<User>;

    async fn permissions(&self, user_id: i32) -> AppResult<Vec<Permission>>;

    async fn set_permissions(&self, user_id: i32, permissions: &[Permission]) -> AppResult<()>;
}

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pub genres: Arc<dyn GenresStore>,
    pub authors: Arc<dyn AuthorsStore>,
    pub books: Arc<dyn BooksStore>,
    pub instances: Arc<dyn InstancesStore>,
    pub users: Arc<dyn UsersStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            genres: Arc::new(genres::GenresRepository::new(pool.clone())),
            authors: Arc::new(authors::AuthorsRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            instances: Arc::new(instances::InstancesRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool)),
        }
    }
}

/// Mocks for every store; unset expectations panic when called
#[cfg(test)]
#[derive(Default)]
pub struct MockStores {
    pub genres: MockGenresStore,
    pub authors: MockAuthorsStore,
    pub books: MockBooksStore,
    pub instances: MockInstancesStore,
    pub users: MockUsersStore,
}

#[cfg(test)]
impl MockStores {
    pub fn into_repository(self) -> Repository {
        Repository {
            genres: Arc::new(self.genres),
            authors: Arc::new(self.authors),
            books: Arc::new(self.books),
            instances: Arc::new(self.instances),
            users: Arc::new(self.users),
        }
    }
}
