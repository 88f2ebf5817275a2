//! Authenticated identity

use serde::{Deserialize, Serialize};

/// Name the identity service reports when nobody is logged in
pub const GUEST_IDENTITY: &str = "Guest";

/// The string a user authenticates as, plus an optional display name.
/// No secret is ever kept here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// True for the anonymous sentinel (or an empty name)
    pub fn is_guest(&self) -> bool {
        let name = self.name.trim();
        name.is_empty() || name.eq_ignore_ascii_case(GUEST_IDENTITY)
    }

    /// Display name when known, the raw name otherwise
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
