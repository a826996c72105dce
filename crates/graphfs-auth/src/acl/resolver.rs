//! Effective access resolver.
//!
//! Access is decided at collection granularity and applies uniformly to
//! everything below the collection. Resolution is a pure function of the
//! graph as seen by the caller's transaction.

use graphfs_core::types::PrincipalId;
use graphfs_entity::{AccessLevel, Capabilities, Resource};
use graphfs_graph::GraphState;

use super::stages;

/// Computes the effective access level of a principal on a resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Effective access of `principal` on `resource`.
    ///
    /// `show_deleted` relaxes the tombstone clamp to "at most List" so that
    /// deleted content can be browsed.
    pub fn effective_access(
        &self,
        graph: &GraphState,
        resource: &Resource,
        principal: &PrincipalId,
        show_deleted: bool,
    ) -> AccessLevel {
        self.resolve(graph, resource, principal, Clamp::Full { show_deleted })
    }

    /// Access for lifecycle management (status, publication, grants,
    /// restore). Read-only and archived states do not clamp it, so a manager
    /// can always bring a collection back; tombstones still keep only Manage.
    pub fn management_access(
        &self,
        graph: &GraphState,
        resource: &Resource,
        principal: &PrincipalId,
    ) -> AccessLevel {
        self.resolve(graph, resource, principal, Clamp::TombstoneOnly)
    }

    fn resolve(
        &self,
        graph: &GraphState,
        resource: &Resource,
        principal: &PrincipalId,
        clamp: Clamp,
    ) -> AccessLevel {
        let Some(collection) = stages::owning_collection(graph, resource) else {
            return AccessLevel::None;
        };

        let node = graph.principal(principal);
        let capabilities: Capabilities = node.map(|p| p.capabilities).unwrap_or_default();

        let mut level = stages::direct(graph, principal, &capabilities, collection);
        if !capabilities.admin {
            if let Some(node) = node {
                level = stages::memberships(graph, node, collection, level);
            }
        }

        let owner_deleted = stages::owner_deleted(graph, collection);
        level = match clamp {
            Clamp::Full { show_deleted } => {
                stages::lifecycle_clamp(level, collection, owner_deleted, show_deleted)
            }
            Clamp::TombstoneOnly if collection.is_deleted() || owner_deleted => {
                stages::tombstone_clamp(level, false)
            }
            Clamp::TombstoneOnly => level,
        };

        stages::admin_recovery(level, &capabilities)
    }
}

#[derive(Debug, Clone, Copy)]
enum Clamp {
    Full { show_deleted: bool },
    TombstoneOnly,
}
