//! Navigation entries and their visibility

use crate::models::{Role, Session};

use super::gate::CapabilityGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub id: &'static str,
    pub label: &'static str,
    /// Empty means any logged-in user
    pub roles: &'static [Role],
}

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem {
        id: "home",
        label: "Home",
        roles: &[],
    },
    NavItem {
        id: "loans_reservations",
        label: "Loans & Reservations",
        roles: &[],
    },
    NavItem {
        id: "books",
        label: "Books",
        roles: &[],
    },
    NavItem {
        id: "members",
        label: "Members",
        roles: &[],
    },
    NavItem {
        id: "reports",
        label: "Reports",
        roles: &[],
    },
    NavItem {
        id: "settings",
        label: "Settings",
        roles: &[],
    },
];

/// Entries the session may open. Nothing is shown until it is authenticated.
pub fn visible(session: &Session) -> Vec<&'static NavItem> {
    if !session.is_authenticated() {
        return Vec::new();
    }
    NAV_ITEMS
        .iter()
        .filter(|item| CapabilityGate::allows(session, item.roles))
        .collect()
}
