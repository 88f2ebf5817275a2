//! Client-side session state

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{identity::Identity, role::Role};

/// Lifecycle of the process-wide session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Uninitialized,
    Resolving,
    Authenticated,
    Anonymous,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionStatus::Uninitialized => "uninitialized",
            SessionStatus::Resolving => "resolving",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Anonymous => "anonymous",
        };
        write!(f, "{}", label)
    }
}

/// Evidence an authenticated session rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionTrust {
    /// The identity service confirmed who is logged in
    ServerConfirmed,
    /// Rebuilt from the persisted hint because the probe was inconclusive
    HintReconstructed,
}

/// The client's current belief about who is logged in.
///
/// Constructors are the only way to build one, which keeps
/// `Authenticated ⇔ identity present` and `Anonymous ⇒ no identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    identity: Option<Identity>,
    roles: BTreeSet<Role>,
    status: SessionStatus,
    trust: Option<SessionTrust>,
}

impl Session {
    pub fn uninitialized() -> Self {
        Self::without_identity(SessionStatus::Uninitialized)
    }

    pub fn resolving() -> Self {
        Self::without_identity(SessionStatus::Resolving)
    }

    pub fn anonymous() -> Self {
        Self::without_identity(SessionStatus::Anonymous)
    }

    pub fn authenticated(identity: Identity, roles: BTreeSet<Role>, trust: SessionTrust) -> Self {
        Self {
            identity: Some(identity),
            roles,
            status: SessionStatus::Authenticated,
            trust: Some(trust),
        }
    }

    fn without_identity(status: SessionStatus) -> Self {
        Self {
            identity: None,
            roles: BTreeSet::new(),
            status,
            trust: None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn trust(&self) -> Option<SessionTrust> {
        self.trust
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Settled means bootstrap has finished one way or the other
    pub fn is_settled(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Authenticated | SessionStatus::Anonymous
        )
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// One-line description, e.g. `Jane (Librarian, Employee)`
    pub fn describe(&self) -> String {
        match &self.identity {
            Some(identity) => {
                let roles: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
                let mut line = format!("{} ({})", identity.label(), roles.join(", "));
                if self.trust == Some(SessionTrust::HintReconstructed) {
                    line.push_str(" [unconfirmed]");
                }
                line
            }
            None => self.status.to_string(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::uninitialized()
    }
}
