//! Permission levels and the action classes they authorize
//!
//! Levels are totally ordered: `view < edit < manage < owner`. Only the first
//! three can be stored on a share; `owner` is synthesized by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HammerspaceError;

/// Resolved permission level for a (principal, object) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PermissionLevel {
    /// Read-only
    View = 0,
    /// Create, update and delete items
    Edit = 1,
    /// Update and delete the collection itself
    Manage = 2,
    /// Creator of the object
    Owner = 3,
}

impl PermissionLevel {
    /// Position in the lattice
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// `granted` authorizes anything `required` does when it ranks at least as high
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::View => "view",
            PermissionLevel::Edit => "edit",
            PermissionLevel::Manage => "manage",
            PermissionLevel::Owner => "owner",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level that can be stored on a collection share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareLevel {
    View,
    Edit,
    Manage,
}

impl Default for ShareLevel {
    fn default() -> Self {
        ShareLevel::View
    }
}

impl ShareLevel {
    pub const ALL: [ShareLevel; 3] = [ShareLevel::View, ShareLevel::Edit, ShareLevel::Manage];

    pub fn as_str(self) -> &'static str {
        PermissionLevel::from(self).as_str()
    }
}

impl From<ShareLevel> for PermissionLevel {
    fn from(level: ShareLevel) -> Self {
        match level {
            ShareLevel::View => PermissionLevel::View,
            ShareLevel::Edit => PermissionLevel::Edit,
            ShareLevel::Manage => PermissionLevel::Manage,
        }
    }
}

impl FromStr for ShareLevel {
    type Err = HammerspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(ShareLevel::View),
            "edit" => Ok(ShareLevel::Edit),
            "manage" => Ok(ShareLevel::Manage),
            other => Err(HammerspaceError::InvalidGrant(format!(
                "'{}' is not a share level. Valid values: view, edit, manage",
                other
            ))),
        }
    }
}

impl fmt::Display for ShareLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action class requested by the boundary layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Read,
    WriteUpdate,
    WriteDelete,
    ManageShares,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::WriteUpdate => "write-update",
            Action::WriteDelete => "write-delete",
            Action::ManageShares => "manage-shares",
        }
    }

    /// Update and delete share one rule
    pub fn is_write(self) -> bool {
        matches!(self, Action::WriteUpdate | Action::WriteDelete)
    }
}

impl FromStr for Action {
    type Err = HammerspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "write-update" | "update" => Ok(Action::WriteUpdate),
            "write-delete" | "delete" => Ok(Action::WriteDelete),
            "manage-shares" => Ok(Action::ManageShares),
            other => Err(HammerspaceError::InvalidInput(format!(
                "unknown action '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_ordering() {
        assert!(PermissionLevel::Owner > PermissionLevel::Manage);
        assert!(PermissionLevel::Manage > PermissionLevel::Edit);
        assert!(PermissionLevel::Edit > PermissionLevel::View);
    }

    #[test]
    fn test_satisfies() {
        assert!(PermissionLevel::Edit.satisfies(PermissionLevel::View));
        assert!(PermissionLevel::Edit.satisfies(PermissionLevel::Edit));
        assert!(!PermissionLevel::Edit.satisfies(PermissionLevel::Manage));
        assert!(PermissionLevel::Owner.satisfies(PermissionLevel::Manage));
        assert!(!PermissionLevel::View.satisfies(PermissionLevel::Edit));
    }

    #[test]
    fn test_share_level_parsing() {
        assert_eq!("edit".parse::<ShareLevel>().unwrap(), ShareLevel::Edit);
        assert!(matches!(
            "owner".parse::<ShareLevel>(),
            Err(HammerspaceError::InvalidGrant(_))
        ));
        assert!(matches!(
            "VIEW".parse::<ShareLevel>(),
            Err(HammerspaceError::InvalidGrant(_))
        ));
    }

    #[test]
    fn test_share_level_never_reaches_owner() {
        for level in ShareLevel::ALL {
            assert!(PermissionLevel::from(level) < PermissionLevel::Owner);
        }
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("read".parse::<Action>().unwrap(), Action::Read);
        assert_eq!("delete".parse::<Action>().unwrap(), Action::WriteDelete);
        assert_eq!(
            "manage-shares".parse::<Action>().unwrap(),
            Action::ManageShares
        );
        assert!("destroy".parse::<Action>().is_err());
        assert!(Action::WriteUpdate.is_write());
        assert!(!Action::ManageShares.is_write());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&PermissionLevel::Owner).unwrap(),
            "\"owner\""
        );
        assert_eq!(
            serde_json::to_string(&Action::WriteUpdate).unwrap(),
            "\"write-update\""
        );
    }
}
