//! Library member model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Member snapshot as returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Backend document name (the membership id)
    #[serde(rename = "name")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub membership_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Member {
    pub const FIELDS: &'static [&'static str] =
        &["name", "title", "membership_id", "email", "phone"];
}

/// Create or update member request
#[derive(Debug, Clone, Serialize, Validate)]
pub struct MemberInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Membership ID is required"))]
    pub membership_id: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
