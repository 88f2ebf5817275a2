//! Book model and related types

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Availability of a book, the single source of truth for loan eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    #[serde(rename = "On Loan")]
    OnLoan,
    Reserved,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::OnLoan => "On Loan",
            BookStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Book snapshot as returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Backend document name (the ISBN)
    #[serde(rename = "name")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    pub status: BookStatus,
    #[serde(default)]
    pub current_borrower: Option<String>,
    #[serde(default)]
    pub current_reservation: Option<String>,
}

impl Book {
    /// Fields requested from the catalog list endpoint
    pub const FIELDS: &'static [&'static str] = &[
        "name",
        "title",
        "author",
        "isbn",
        "published_date",
        "status",
        "current_borrower",
        "current_reservation",
    ];
}

/// Create or update book request
#[derive(Debug, Clone, Serialize, Validate)]
pub struct BookInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub published_date: Option<String>,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    pub status: BookStatus,
}
