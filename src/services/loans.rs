//! Loan management service: copies, borrower lists and renewals

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{
        field_error,
        instance::{
            BookInstance, BookInstanceDetails, CreateInstance, LoanStatus, RenewalForm,
            RenewalProposal, UpdateInstance,
        },
        page::{Page, PageRequest},
        user::{Permission, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
    page_size: i64,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig, page_size: i64) -> Self {
        Self {
            repository,
            config,
            page_size,
        }
    }

    /// Copies borrowed by the caller, by due date
    pub async fn my_loans(
        &self,
        claims: &UserClaims,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<Page<BookInstanceDetails>> {
        let request = PageRequest::new(page, self.page_size)?;
        let (instances, total) = self
            .repository
            .instances
            .list_by_borrower(claims.user_id, request)
            .await?;

        Page::new(flag_overdue(instances, today), total, request)
    }

    /// Every copy on loan, by due date
    pub async fn all_borrowed(
        &self,
        claims: &UserClaims,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<Page<BookInstanceDetails>> {
        claims.require_permission(Permission::CanMarkReturned)?;

        let request = PageRequest::new(page, self.page_size)?;
        let (instances, total) = self.repository.instances.list_on_loan(request).await?;

        Page::new(flag_overdue(instances, today), total, request)
    }

    pub async fn get_instance(&self, id: Uuid, today: NaiveDate) -> AppResult<BookInstanceDetails> {
        let instance = self.repository.instances.get_by_id(id).await?;
        Ok(instance.with_overdue_flag(today))
    }

    /// Registers a new physical copy under a fresh id
    pub async fn create_instance(
        &self,
        claims: &UserClaims,
        data: CreateInstance,
    ) -> AppResult<BookInstance> {
        claims.require_permission(Permission::CanMarkReturned)?;
        self.check_references(Some(data.book_id), data.borrower_id).await?;

        let instance = self
            .repository
            .instances
            .create(Uuid::new_v4(), &data)
            .await?;
        tracing::info!(instance_id = %instance.id, book_id = data.book_id, "Book instance created");
        Ok(instance)
    }

    /// Librarian edit of a copy: lend, return or send to maintenance
    pub async fn update_instance(
        &self,
        claims: &UserClaims,
        id: Uuid,
        data: UpdateInstance,
    ) -> AppResult<BookInstance> {
        claims.require_permission(Permission::CanMarkReturned)?;
        self.check_references(None, data.borrower_id).await?;

        let instance = self.repository.instances.update(id, &data).await?;
        tracing::info!(instance_id = %id, status = %instance.status, "Book instance updated");
        Ok(instance)
    }

    /// Back on the shelf: available, no borrower, no due date
    pub async fn mark_returned(&self, claims: &UserClaims, id: Uuid) -> AppResult<BookInstance> {
        claims.require_permission(Permission::CanMarkReturned)?;

        let returned = UpdateInstance {
            borrower_id: None,
            status: LoanStatus::Available,
            due_back: None,
        };
        let instance = self.repository.instances.update(id, &returned).await?;
        tracing::info!(instance_id = %id, "Book instance returned");
        Ok(instance)
    }

    /// The renewal form as first shown, with the default proposed date
    pub async fn renewal_form(
        &self,
        claims: &UserClaims,
        id: Uuid,
        today: NaiveDate,
    ) -> AppResult<RenewalProposal> {
        claims.require_permission(Permission::CanMarkReturned)?;

        let instance = self.get_instance(id, today).await?;
        Ok(RenewalProposal {
            instance,
            proposed_renewal_date: today + Duration::days(self.config.default_renewal_days),
        })
    }

    /// Sets a new due date. Nothing is written when the date is rejected.
    pub async fn renew(
        &self,
        claims: &UserClaims,
        id: Uuid,
        form: RenewalForm,
        today: NaiveDate,
    ) -> AppResult<BookInstanceDetails> {
        claims.require_permission(Permission::CanMarkReturned)?;

        // 404 takes precedence over a bad date
        self.repository.instances.get_by_id(id).await?;

        let due_back = form.clean(today, self.config.max_renewal_days)?;
        self.repository.instances.set_due_back(id, due_back).await?;
        tracing::info!(instance_id = %id, %due_back, renewed_by = claims.user_id, "Loan renewed");

        self.get_instance(id, today).await
    }

    /// Referenced book and borrower must exist
    async fn check_references(&self, book_id: Option<i32>, borrower_id: Option<i32>) -> AppResult<()> {
        let mut errors = validator::ValidationErrors::new();

        if let Some(book_id) = book_id {
            match self.repository.books.get_by_id(book_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => errors.add(
                    "book_id",
                    field_error(
                        "invalid_choice",
                        format!("Select a valid choice. Book {} does not exist.", book_id),
                    ),
                ),
                Err(e) => return Err(e),
            }
        }

        if let Some(borrower_id) = borrower_id {
            match self.repository.users.get_by_id(borrower_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => errors.add(
                    "borrower_id",
                    field_error(
                        "invalid_choice",
                        format!("Select a valid choice. User {} does not exist.", borrower_id),
                    ),
                ),
                Err(e) => return Err(e),
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(errors))
        }
    }
}

fn flag_overdue(instances: Vec<BookInstanceDetails>, today: NaiveDate) -> Vec<BookInstanceDetails> {
    instances
        .into_iter()
        .map(|instance| instance.with_overdue_flag(today))
        .collect()
}
