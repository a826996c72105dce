//! User directory configuration.
//!
//! The platform's user directory is an external collaborator; this section
//! is the static form of it. Entries are synced into the graph as principal
//! nodes on startup.

use serde::{Deserialize, Serialize};

/// Users and workspaces known to the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Individual users.
    #[serde(default)]
    pub users: Vec<UserEntry>,
    /// Workspaces (groups) users belong to.
    #[serde(default)]
    pub workspaces: Vec<WorkspaceEntry>,
}

/// A single user and their platform-wide capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    /// Stable user identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Argon2 PHC string used for Basic authentication.
    pub password_hash: String,
    /// Platform administrator flag.
    #[serde(default)]
    pub admin: bool,
    /// May list collections whose metadata is published.
    #[serde(default)]
    pub can_view_public_metadata: bool,
    /// May read collections whose data is published.
    #[serde(default)]
    pub can_view_public_data: bool,
}

/// A workspace and its member/manager edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    /// Stable workspace identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// User ids with member role.
    #[serde(default)]
    pub members: Vec<String>,
    /// User ids with manager role.
    #[serde(default)]
    pub managers: Vec<String>,
}
