//! Capability checks for gated actions
//!
//! Always evaluated against the live session passed in; nothing is cached, so
//! a login or logout is reflected by the very next check.

use crate::{
    error::{AppError, AppResult},
    models::{Role, Session, SessionStatus},
};

/// Roles allowed to create, edit and delete books and members
pub const CATALOG_EDITORS: &[Role] = &[Role::Administrator, Role::Librarian];

/// Roles allowed to issue loans
pub const LOAN_ISSUERS: &[Role] = &[Role::Administrator, Role::Librarian];

pub struct CapabilityGate;

impl CapabilityGate {
    /// True when `required` is empty, or the session is authenticated and
    /// holds at least one of the required roles
    pub fn allows(session: &Session, required: &[Role]) -> bool {
        if required.is_empty() {
            return true;
        }
        session.is_authenticated() && required.iter().any(|role| session.has_role(*role))
    }

    /// Like [`CapabilityGate::allows`], with a reason when denied
    pub fn require(session: &Session, required: &[Role], action: &str) -> AppResult<()> {
        if Self::allows(session, required) {
            return Ok(());
        }

        let reason = match session.status() {
            SessionStatus::Authenticated => {
                let roles: Vec<&str> = required.iter().map(Role::as_str).collect();
                format!("{} requires one of: {}", action, roles.join(", "))
            }
            status => not_logged_in(action, status),
        };
        tracing::info!("Denied: {}", reason);
        Err(AppError::Permission(reason))
    }

    /// Any authenticated session, whatever its roles
    pub fn require_authenticated(session: &Session, action: &str) -> AppResult<()> {
        if session.is_authenticated() {
            Ok(())
        } else {
            let reason = not_logged_in(action, session.status());
            tracing::info!("Denied: {}", reason);
            Err(AppError::Permission(reason))
        }
    }
}

fn not_logged_in(action: &str, status: SessionStatus) -> String {
    match status {
        SessionStatus::Uninitialized | SessionStatus::Resolving => {
            format!("{} is unavailable until the session is resolved", action)
        }
        _ => format!("{} requires you to be logged in", action),
    }
}

/// Which gated actions a session may see, for toggling forms and buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionVisibility {
    pub edit_catalog: bool,
    pub issue_loans: bool,
    pub make_reservations: bool,
}

impl ActionVisibility {
    pub fn for_session(session: &Session) -> Self {
        Self {
            edit_catalog: CapabilityGate::allows(session, CATALOG_EDITORS),
            issue_loans: CapabilityGate::allows(session, LOAN_ISSUERS),
            make_reservations: session.is_authenticated(),
        }
    }
}
