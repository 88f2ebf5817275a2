//! Role inference from identity strings
//!
//! This is the only place roles are derived from a raw identity. Rules are
//! evaluated in a fixed order and the first match wins, because informal
//! identities like `member_librarian` can match several of them.

use std::collections::BTreeSet;

use crate::{
    config::{RolesConfig, UnmatchedPolicy},
    models::{Identity, Role},
};

#[derive(Debug, Clone)]
pub struct RoleResolver {
    admin_identity: String,
    librarian_markers: Vec<String>,
    member_markers: Vec<String>,
    unmatched_policy: UnmatchedPolicy,
}

impl RoleResolver {
    pub fn new(config: &RolesConfig) -> Self {
        let normalize = |markers: &[String]| -> Vec<String> {
            markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect()
        };

        Self {
            admin_identity: config.admin_identity.trim().to_lowercase(),
            librarian_markers: normalize(&config.librarian_markers),
            member_markers: normalize(&config.member_markers),
            unmatched_policy: config.unmatched_policy,
        }
    }

    /// Map an identity to its role set. Total and deterministic.
    pub fn resolve(&self, identity: &Identity) -> BTreeSet<Role> {
        let name = identity.as_str().trim().to_lowercase();

        if !self.admin_identity.is_empty() && name == self.admin_identity {
            return BTreeSet::from([Role::Administrator, Role::SystemManager]);
        }
        if self.librarian_markers.iter().any(|m| name.contains(m.as_str())) {
            return BTreeSet::from([Role::Librarian, Role::Employee]);
        }
        if self.member_markers.iter().any(|m| name.contains(m.as_str())) {
            return BTreeSet::from([Role::Member]);
        }

        match self.unmatched_policy {
            UnmatchedPolicy::FailClosed => {
                tracing::info!("Identity '{}' matches no role rule, granting no roles", identity);
                BTreeSet::new()
            }
            UnmatchedPolicy::SystemManager => {
                tracing::warn!(
                    "Identity '{}' matches no role rule, defaulting to System Manager",
                    identity
                );
                BTreeSet::from([Role::SystemManager])
            }
        }
    }
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new(&RolesConfig::default())
    }
}
