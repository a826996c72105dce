//! Principal entity model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use graphfs_core::types::PrincipalId;

/// Whether a principal is an individual or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// An individual user.
    User,
    /// A workspace (group) that users belong to.
    Workspace,
}

/// Role of a user inside a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Ordinary member.
    Member,
    /// Workspace manager.
    Manager,
}

/// Platform-wide capability flags supplied by the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Platform administrator.
    pub admin: bool,
    /// May list collections whose metadata is published.
    pub can_view_public_metadata: bool,
    /// May read collections whose data is published.
    pub can_view_public_data: bool,
}

/// A user or workspace node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Identifier issued by the user directory.
    pub id: PrincipalId,
    /// Display name.
    pub name: String,
    /// User or workspace.
    pub kind: PrincipalKind,
    /// Capability flags.
    pub capabilities: Capabilities,
    /// Workspace memberships, keyed by workspace id.
    #[serde(default)]
    pub memberships: BTreeMap<PrincipalId, MembershipRole>,
    /// Tombstone for removed workspaces.
    #[serde(default)]
    pub date_deleted: Option<DateTime<Utc>>,
}

impl Principal {
    /// Create a user principal.
    pub fn user(id: impl Into<PrincipalId>, name: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: PrincipalKind::User,
            capabilities,
            memberships: BTreeMap::new(),
            date_deleted: None,
        }
    }

    /// Create a workspace principal. Workspaces carry no capabilities.
    pub fn workspace(id: impl Into<PrincipalId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: PrincipalKind::Workspace,
            capabilities: Capabilities::default(),
            memberships: BTreeMap::new(),
            date_deleted: None,
        }
    }

    /// Add or replace a membership edge.
    pub fn with_membership(mut self, workspace: impl Into<PrincipalId>, role: MembershipRole) -> Self {
        self.memberships.insert(workspace.into(), role);
        self
    }

    pub fn is_admin(&self) -> bool {
        self.capabilities.admin
    }

    pub fn is_deleted(&self) -> bool {
        self.date_deleted.is_some()
    }

    /// Workspaces this principal is a member or manager of.
    pub fn workspaces(&self) -> impl Iterator<Item = &PrincipalId> {
        self.memberships.keys()
    }
}
