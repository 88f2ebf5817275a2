//! Loan and reservation transaction types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Identifier of a loan created by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(pub String);

/// Identifier of a reservation created by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl std::fmt::Display for LoanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loan form as filled in by the user. Kept intact by the coordinator so a
/// failed submission can be corrected and sent again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct LoanForm {
    #[validate(length(min = 1, message = "Please select a book"))]
    pub book_id: String,
    #[validate(length(min = 1, message = "Please select a member"))]
    pub member_id: String,
    /// Defaults to today
    pub loan_date: Option<String>,
    #[validate(length(min = 1, message = "Please choose a return date"))]
    pub return_date: String,
}

/// Reservation form as filled in by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ReservationForm {
    #[validate(length(min = 1, message = "Please select a book"))]
    pub book_id: String,
    #[validate(length(min = 1, message = "Please select a member"))]
    pub member_id: String,
    /// Defaults to today
    pub reservation_date: Option<String>,
}

/// Body of the loan transaction call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanTransaction {
    pub book_name: String,
    pub member_name: String,
    pub loan_date: NaiveDate,
    pub return_date: NaiveDate,
}

/// Body of the reservation transaction call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationTransaction {
    pub book_name: String,
    pub member_name: String,
    pub reservation_date: NaiveDate,
}

impl LoanForm {
    pub fn new(
        book_id: impl Into<String>,
        member_id: impl Into<String>,
        return_date: impl Into<String>,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            member_id: member_id.into(),
            loan_date: None,
            return_date: return_date.into(),
        }
    }

    /// Check the form and build the request body, without touching the network
    pub fn to_transaction(&self, today: NaiveDate) -> AppResult<LoanTransaction> {
        let trimmed = Self {
            book_id: self.book_id.trim().to_string(),
            member_id: self.member_id.trim().to_string(),
            loan_date: self.loan_date.as_deref().map(str::trim).map(String::from),
            return_date: self.return_date.trim().to_string(),
        };
        trimmed.validate()?;

        let loan_date = optional_date(trimmed.loan_date.as_deref(), "Loan date", today)?;
        let return_date = parse_date(&trimmed.return_date, "Return date")?;
        if return_date < loan_date {
            return Err(AppError::Validation(
                "Return date cannot be before the loan date".to_string(),
            ));
        }

        Ok(LoanTransaction {
            book_name: trimmed.book_id,
            member_name: trimmed.member_id,
            loan_date,
            return_date,
        })
    }
}

impl ReservationForm {
    pub fn new(book_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            member_id: member_id.into(),
            reservation_date: None,
        }
    }

    pub fn to_transaction(&self, today: NaiveDate) -> AppResult<ReservationTransaction> {
        let trimmed = Self {
            book_id: self.book_id.trim().to_string(),
            member_id: self.member_id.trim().to_string(),
            reservation_date: self.reservation_date.as_deref().map(str::trim).map(String::from),
        };
        trimmed.validate()?;

        let reservation_date =
            optional_date(trimmed.reservation_date.as_deref(), "Reservation date", today)?;

        Ok(ReservationTransaction {
            book_name: trimmed.book_id,
            member_name: trimmed.member_id,
            reservation_date,
        })
    }
}

fn parse_date(value: &str, label: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        AppError::Validation(format!("{} must be a date formatted as YYYY-MM-DD", label))
    })
}

fn optional_date(value: Option<&str>, label: &str, default: NaiveDate) -> AppResult<NaiveDate> {
    match value {
        Some(v) if !v.is_empty() => parse_date(v, label),
        _ => Ok(default),
    }
}
