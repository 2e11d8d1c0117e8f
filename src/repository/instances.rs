//! Book instances repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::InstancesStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        instance::{BookInstance, BookInstanceDetails, CreateInstance, LoanStatus, UpdateInstance},
        page::PageRequest,
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.due_back, bi.status,
           bi.borrower_id, u.username AS borrower_username
    FROM book_instances bi
    LEFT JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

const DUE_BACK_ORDER: &str = "ORDER BY bi.due_back ASC NULLS LAST, bi.id";

const INSTANCE_COLUMNS: &str = "id, book_id, due_back, status, borrower_id";

#[derive(Clone)]
pub struct InstancesRepository {
    pool: Pool<Postgres>,
}

impl InstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstancesStore for InstancesRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        let query = format!("{} WHERE bi.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, BookInstanceDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance with id {} not found", id)))
    }

    async fn list_by_book(&self, book_id: i32) -> AppResult<Vec<BookInstanceDetails>> {
        let query = format!("{} WHERE bi.book_id = $1 {}", DETAILS_SELECT, DUE_BACK_ORDER);
        let instances = sqlx::query_as::<_, BookInstanceDetails>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(instances)
    }

    async fn list_by_borrower(
        &self,
        borrower_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE borrower_id = $1")
                .bind(borrower_id)
                .fetch_one(&self.pool)
                .await?;

        let query = format!(
            "{} WHERE bi.borrower_id = $1 {} LIMIT $2 OFFSET $3",
            DETAILS_SELECT, DUE_BACK_ORDER
        );
        let instances = sqlx::query_as::<_, BookInstanceDetails>(&query)
            .bind(borrower_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((instances, total))
    }

    async fn list_on_loan(&self, page: PageRequest) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let total = self.count_by_status(LoanStatus::OnLoan).await?;

        let query = format!(
            "{} WHERE bi.status = $1 {} LIMIT $2 OFFSET $3",
            DETAILS_SELECT, DUE_BACK_ORDER
        );
        let instances = sqlx::query_as::<_, BookInstanceDetails>(&query)
            .bind(LoanStatus::OnLoan)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((instances, total))
    }

    async fn create(&self, id: Uuid, data: &CreateInstance) -> AppResult<BookInstance> {
        let query = format!(
            r#"
            INSERT INTO book_instances (id, book_id, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        );
        let instance = sqlx::query_as::<_, BookInstance>(&query)
            .bind(id)
            .bind(data.book_id)
            .bind(data.due_back)
            .bind(data.status)
            .bind(data.borrower_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(instance)
    }

    async fn update(&self, id: Uuid, data: &UpdateInstance) -> AppResult<BookInstance> {
        let query = format!(
            r#"
            UPDATE book_instances
            SET borrower_id = $1, status = $2, due_back = $3
            WHERE id = $4
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(data.borrower_id)
            .bind(data.status)
            .bind(data.due_back)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance with id {} not found", id)))
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance with id {} not found", id)));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
