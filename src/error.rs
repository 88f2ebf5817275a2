//! Error types for the library client

use thiserror::Error;

/// Coarse error classification used by callers to pick a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input must be fixed before anything is sent
    Validation,
    /// The current session may not perform the action
    Permission,
    /// Identity service rejected a login/logout/probe
    Auth,
    /// The remote transaction endpoint rejected the request
    Transaction,
    /// Transport failure, distinct from a semantic rejection
    Network,
    /// Local storage, configuration or unexpected failures
    Internal,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Login already in progress")]
    LoginInProgress,

    #[error("Transaction rejected: {0}")]
    Transaction(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Permission(_) => ErrorKind::Permission,
            AppError::Authentication(_) | AppError::LoginInProgress => ErrorKind::Auth,
            AppError::Transaction(_) => ErrorKind::Transaction,
            AppError::Network(_) => ErrorKind::Network,
            AppError::Storage(_) | AppError::Config(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Human-readable message separating "fix your input", "you can't do this"
    /// and "that didn't work"
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Please fix your input: {}", msg),
            AppError::Permission(msg) => format!("You are not allowed to do this: {}", msg),
            AppError::LoginInProgress => {
                "That didn't work: a login is already in progress, please wait".to_string()
            }
            AppError::Authentication(msg)
            | AppError::Transaction(msg)
            | AppError::Network(msg)
            | AppError::Storage(msg)
            | AppError::Config(msg)
            | AppError::Internal(msg) => format!("That didn't work: {}", msg),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        // field_errors() is a HashMap, keep messages stable for callers
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
