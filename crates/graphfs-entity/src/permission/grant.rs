//! Permission grant edges.
//!
//! A grant is the *existence* of a typed edge from a principal to a
//! collection. A pair may carry several edges; the highest one wins.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::access::AccessLevel;

/// Predicate of a principal → resource permission edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrantEdge {
    /// `canList`
    #[serde(rename = "canList")]
    CanList,
    /// `canRead`
    #[serde(rename = "canRead")]
    CanRead,
    /// `canWrite`
    #[serde(rename = "canWrite")]
    CanWrite,
    /// `canManage`
    #[serde(rename = "canManage")]
    CanManage,
}

impl GrantEdge {
    /// The access level implied by this edge.
    pub fn level(&self) -> AccessLevel {
        match self {
            Self::CanList => AccessLevel::List,
            Self::CanRead => AccessLevel::Read,
            Self::CanWrite => AccessLevel::Write,
            Self::CanManage => AccessLevel::Manage,
        }
    }

    /// The edge that grants exactly `level`, if any.
    pub fn for_level(level: AccessLevel) -> Option<Self> {
        match level {
            AccessLevel::None => None,
            AccessLevel::List => Some(Self::CanList),
            AccessLevel::Read => Some(Self::CanRead),
            AccessLevel::Write => Some(Self::CanWrite),
            AccessLevel::Manage => Some(Self::CanManage),
        }
    }

    /// Predicate name as stored in the graph.
    pub fn predicate(&self) -> &'static str {
        match self {
            Self::CanList => "canList",
            Self::CanRead => "canRead",
            Self::CanWrite => "canWrite",
            Self::CanManage => "canManage",
        }
    }
}

impl fmt::Display for GrantEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.predicate())
    }
}

/// Highest level carried by a set of edges; `None` for no edges.
pub fn highest_level<'a>(edges: impl IntoIterator<Item = &'a GrantEdge>) -> AccessLevel {
    edges
        .into_iter()
        .map(GrantEdge::level)
        .max()
        .unwrap_or(AccessLevel::None)
}
