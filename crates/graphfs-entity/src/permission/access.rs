//! Access level enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Effective access of a principal on a resource.
///
/// Ordered by privilege: None < List < Read < Write < Manage. Levels are
/// only ever combined with `max`/`min`, never subtracted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// No access; the resource is invisible.
    #[default]
    None,
    /// Can see that the resource exists and list its children.
    List,
    /// Can read content and metadata.
    Read,
    /// Can create, modify, move, and delete content.
    Write,
    /// Can change lifecycle state, publication mode, and grants.
    Manage,
}

impl AccessLevel {
    /// All levels in ascending order.
    pub const ALL: [AccessLevel; 5] = [
        Self::None,
        Self::List,
        Self::Read,
        Self::Write,
        Self::Manage,
    ];

    /// Check if this level grants at least the given level.
    pub fn has_at_least(&self, required: AccessLevel) -> bool {
        *self >= required
    }

    pub fn can_list(&self) -> bool {
        self.has_at_least(Self::List)
    }

    pub fn can_read(&self) -> bool {
        self.has_at_least(Self::Read)
    }

    pub fn can_write(&self) -> bool {
        self.has_at_least(Self::Write)
    }

    pub fn can_manage(&self) -> bool {
        self.has_at_least(Self::Manage)
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::List => "list",
            Self::Read => "read",
            Self::Write => "write",
            Self::Manage => "manage",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = graphfs_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "list" => Ok(Self::List),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "manage" => Ok(Self::Manage),
            _ => Err(graphfs_core::AppError::validation(format!(
                "Invalid access level: '{s}'. Expected one of: none, list, read, write, manage"
            ))),
        }
    }
}
