//! Permission names and their canonical order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named capability a role can be granted.
///
/// The declaration order is the storage bit order. Append new variants at the
/// end and add them to [`PermissionName::ALL`]; never reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionName {
    EditPages,
    CreatePages,
    VoteOnPages,
    TagPages,
    RevertRevisions,
    DeletePages,
    RatePages,
    LockPages,
    ModifyLockedPages,
    CreateEditRoles,
    PromoteRoles,
}

/// Number of known permissions (and of meaningful bits in the bitfield).
pub const NUM_PERMISSIONS: usize = PermissionName::ALL.len();

impl PermissionName {
    /// Every permission in canonical (bit) order.
    pub const ALL: [PermissionName; 11] = [
        PermissionName::EditPages,
        PermissionName::CreatePages,
        PermissionName::VoteOnPages,
        PermissionName::TagPages,
        PermissionName::RevertRevisions,
        PermissionName::DeletePages,
        PermissionName::RatePages,
        PermissionName::LockPages,
        PermissionName::ModifyLockedPages,
        PermissionName::CreateEditRoles,
        PermissionName::PromoteRoles,
    ];

    /// Bit position of this permission.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|p| *p == self)
            .unwrap_or(NUM_PERMISSIONS)
    }

    /// Stable machine key, e.g. `edit-pages`.
    pub fn key(self) -> &'static str {
        match self {
            PermissionName::EditPages => "edit-pages",
            PermissionName::CreatePages => "create-pages",
            PermissionName::VoteOnPages => "vote-on-pages",
            PermissionName::TagPages => "tag-pages",
            PermissionName::RevertRevisions => "revert-revisions",
            PermissionName::DeletePages => "delete-pages",
            PermissionName::RatePages => "rate-pages",
            PermissionName::LockPages => "lock-pages",
            PermissionName::ModifyLockedPages => "modify-locked-pages",
            PermissionName::CreateEditRoles => "create-edit-roles",
            PermissionName::PromoteRoles => "promote-roles",
        }
    }

    /// Human-readable label shown in role editors.
    pub fn display_name(self) -> &'static str {
        match self {
            PermissionName::EditPages => "Edit Pages",
            PermissionName::CreatePages => "Create Pages",
            PermissionName::VoteOnPages => "Vote on Pages",
            PermissionName::TagPages => "Tag Pages",
            PermissionName::RevertRevisions => "Revert Revisions",
            PermissionName::DeletePages => "Delete Pages",
            PermissionName::RatePages => "Rate Pages",
            PermissionName::LockPages => "Lock Pages",
            PermissionName::ModifyLockedPages => {
                "Modify Locked Pages (Every action they can do normally, can be done to locked pages)"
            }
            PermissionName::CreateEditRoles => "Create and Edit Roles",
            PermissionName::PromoteRoles => "Promote Users to Roles",
        }
    }

    /// Baseline value in a freshly created permission set.
    pub fn default_value(self) -> bool {
        matches!(
            self,
            PermissionName::EditPages
                | PermissionName::CreatePages
                | PermissionName::VoteOnPages
                | PermissionName::TagPages
                | PermissionName::RevertRevisions
                | PermissionName::RatePages
        )
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when parsing a permission key that is not known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for PermissionName {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.key() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_is_stable() {
        // Stored bitfields depend on these positions.
        assert_eq!(PermissionName::EditPages.index(), 0);
        assert_eq!(PermissionName::DeletePages.index(), 5);
        assert_eq!(PermissionName::RatePages.index(), 6);
        assert_eq!(PermissionName::PromoteRoles.index(), 10);
        assert_eq!(NUM_PERMISSIONS, 11);
    }

    #[test]
    fn test_key_round_trip() {
        for name in PermissionName::ALL {
            assert_eq!(name.key().parse::<PermissionName>().unwrap(), name);
        }
        assert!("fly".parse::<PermissionName>().is_err());
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&PermissionName::ModifyLockedPages).unwrap();
        assert_eq!(json, "\"modify-locked-pages\"");
    }
}
