//! Roles granting capabilities to a session

use serde::{Deserialize, Serialize};

/// Capability bucket attached to a session (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Administrator,
    Librarian,
    Member,
    Employee,
    #[serde(rename = "System Manager")]
    SystemManager,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Administrator,
        Role::Librarian,
        Role::Member,
        Role::Employee,
        Role::SystemManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Librarian => "Librarian",
            Role::Member => "Member",
            Role::Employee => "Employee",
            Role::SystemManager => "System Manager",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', '-'], " ").as_str() {
            "administrator" => Ok(Role::Administrator),
            "librarian" => Ok(Role::Librarian),
            "member" => Ok(Role::Member),
            "employee" => Ok(Role::Employee),
            "system manager" | "systemmanager" => Ok(Role::SystemManager),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}
