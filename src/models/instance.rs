//! Book instance (physical copy) model and loan related types

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationErrors;

use super::field_error;

/// Availability of a copy, stored as a one-letter code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Maintenance,
    OnLoan,
    #[default]
    Available,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            other => Err(format!("Invalid loan status code: {}", other)),
        }
    }
}

// Stored in a CHAR(1) column
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// True when `due_back` is set and already passed.
pub fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    matches!(due_back, Some(due) if today > due)
}

/// Book instance row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: Option<i32>,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        is_overdue(self.due_back, today)
    }
}

/// Book instance with book title and borrower resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstanceDetails {
    pub id: Uuid,
    pub book_id: Option<i32>,
    pub book_title: Option<String>,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    pub borrower_username: Option<String>,
    /// Computed against the server date when the record is served
    #[sqlx(skip)]
    #[serde(default)]
    pub is_overdue: bool,
}

impl BookInstanceDetails {
    pub fn with_overdue_flag(mut self, today: NaiveDate) -> Self {
        self.is_overdue = is_overdue(self.due_back, today);
        self
    }
}

impl std::fmt::Display for BookInstanceDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.book_title.as_deref().unwrap_or("no book"))
    }
}

/// Register a new physical copy
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct CreateInstance {
    pub book_id: i32,
    #[serde(default)]
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
}

/// Librarian edit of a copy: lend, return or send to maintenance
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct UpdateInstance {
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
}

/// Renewal form submitted by a librarian
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenewalForm {
    pub renewal_date: Option<NaiveDate>,
}

impl RenewalForm {
    /// Accepts a date within `[today, today + max_days]`.
    pub fn clean(&self, today: NaiveDate, max_days: i64) -> Result<NaiveDate, ValidationErrors> {
        let error = match self.renewal_date {
            None => field_error("required", "This field is required."),
            Some(date) if date < today => {
                field_error("renewal_in_past", "Invalid date - renewal in past")
            }
            Some(date) if date > today + Duration::days(max_days) => field_error(
                "renewal_too_far",
                format!("Invalid date - renewal more than {} days ahead", max_days),
            ),
            Some(date) => return Ok(date),
        };

        let mut errors = ValidationErrors::new();
        errors.add("renewal_date", error);
        Err(errors)
    }
}

/// Renewal form as first shown: the copy and the proposed date
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalProposal {
    pub instance: BookInstanceDetails,
    pub proposed_renewal_date: NaiveDate,
}
