//! Ordered rule stages of access resolution.
//!
//! Each stage is a pure function of the graph and the level computed so
//! far. [`super::PermissionResolver`] chains them in order:
//!
//! 1. locate the owning collection
//! 2. highest direct grant edge
//! 3. administrator override
//! 4. publication (data published, metadata published)
//! 5. workspace memberships (stages 2–4 per workspace, maximum wins)
//! 6. lifecycle clamp (tombstone, then read-only or archived)
//! 7. administrator recovery

use graphfs_core::types::PrincipalId;
use graphfs_entity::{AccessLevel, Capabilities, LifecycleStatus, Principal, Resource};
use graphfs_graph::GraphState;

/// Stage 1: the top-level collection `resource` belongs to.
pub fn owning_collection<'g>(graph: &'g GraphState, resource: &'g Resource) -> Option<&'g Resource> {
    if resource.is_collection() {
        return Some(resource);
    }
    graph
        .resource(&resource.collection)
        .filter(|c| c.is_collection())
}

/// Stage 2: highest grant edge from `principal` to `collection`.
pub fn granted(graph: &GraphState, principal: &PrincipalId, collection: &Resource) -> AccessLevel {
    graph.granted_level(principal, &collection.id)
}

/// Stage 3: administrators get everything.
pub fn admin_override(level: AccessLevel, capabilities: &Capabilities) -> AccessLevel {
    if capabilities.admin {
        AccessLevel::Manage
    } else {
        level
    }
}

/// Stage 4: published collections are visible to principals holding the
/// matching platform capability.
pub fn publication(level: AccessLevel, capabilities: &Capabilities, collection: &Resource) -> AccessLevel {
    let mode = collection.access_mode();
    let mut level = level;
    if mode.publishes_data() && capabilities.can_view_public_data {
        level = level.max(AccessLevel::Read);
    }
    if mode.publishes_metadata() && capabilities.can_view_public_metadata {
        level = level.max(AccessLevel::List);
    }
    level
}

/// Stages 2–4 for one principal.
pub fn direct(
    graph: &GraphState,
    principal: &PrincipalId,
    capabilities: &Capabilities,
    collection: &Resource,
) -> AccessLevel {
    let level = granted(graph, principal, collection);
    if capabilities.admin {
        return admin_override(level, capabilities);
    }
    publication(level, capabilities, collection)
}

/// Stage 5: the best level obtainable through any live workspace the
/// principal belongs to, combined with `level`.
pub fn memberships(
    graph: &GraphState,
    principal: &Principal,
    collection: &Resource,
    level: AccessLevel,
) -> AccessLevel {
    principal
        .workspaces()
        .filter_map(|id| graph.principal(id))
        .filter(|workspace| !workspace.is_deleted())
        .map(|workspace| direct(graph, &workspace.id, &workspace.capabilities, collection))
        .fold(level, AccessLevel::max)
}

/// Stage 6: lifecycle may only lower the level.
///
/// A tombstoned collection (or one owned by a tombstoned workspace) keeps
/// only Manage, or at most List when tombstones are being viewed. Otherwise
/// read-only collections allow at most Read and archived ones at most List.
pub fn lifecycle_clamp(
    level: AccessLevel,
    collection: &Resource,
    owner_deleted: bool,
    show_deleted: bool,
) -> AccessLevel {
    if collection.is_deleted() || owner_deleted {
        return tombstone_clamp(level, show_deleted);
    }
    status_clamp(level, collection.lifecycle())
}

/// Clamp for tombstoned collections.
pub fn tombstone_clamp(level: AccessLevel, show_deleted: bool) -> AccessLevel {
    if show_deleted {
        level.min(AccessLevel::List)
    } else if level == AccessLevel::Manage {
        AccessLevel::Manage
    } else {
        AccessLevel::None
    }
}

/// Clamp for live collections by lifecycle status.
pub fn status_clamp(level: AccessLevel, status: LifecycleStatus) -> AccessLevel {
    match status {
        LifecycleStatus::ReadOnly => level.min(AccessLevel::Read),
        LifecycleStatus::Archived => level.min(AccessLevel::List),
        LifecycleStatus::Active | LifecycleStatus::Deleted => level,
    }
}

/// Stage 7: administrators can always write-recover.
pub fn admin_recovery(level: AccessLevel, capabilities: &Capabilities) -> AccessLevel {
    if level == AccessLevel::None && capabilities.admin {
        AccessLevel::Write
    } else {
        level
    }
}

/// Whether the workspace owning `collection` has been tombstoned.
pub fn owner_deleted(graph: &GraphState, collection: &Resource) -> bool {
    collection
        .owned_by()
        .and_then(|id| graph.principal(id))
        .is_some_and(Principal::is_deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use graphfs_entity::{PublicationMode, ResourceKind};

    fn collection(status: LifecycleStatus, access_mode: PublicationMode) -> Resource {
        let mut coll = Resource::collection("c", &PrincipalId::new("owner"), Utc::now());
        coll.kind = ResourceKind::Collection {
            status,
            access_mode,
            owned_by: None,
        };
        coll
    }

    fn caps(admin: bool, metadata: bool, data: bool) -> Capabilities {
        Capabilities {
            admin,
            can_view_public_metadata: metadata,
            can_view_public_data: data,
        }
    }

    #[test]
    fn test_admin_override() {
        assert_eq!(
            admin_override(AccessLevel::None, &caps(true, false, false)),
            AccessLevel::Manage
        );
        assert_eq!(
            admin_override(AccessLevel::Read, &caps(false, false, false)),
            AccessLevel::Read
        );
    }

    #[test]
    fn test_publication_raises_only() {
        let data = collection(LifecycleStatus::Active, PublicationMode::DataPublished);
        let meta = collection(LifecycleStatus::Active, PublicationMode::MetadataPublished);
        let private = collection(LifecycleStatus::Active, PublicationMode::Private);

        assert_eq!(
            publication(AccessLevel::None, &caps(false, false, true), &data),
            AccessLevel::Read
        );
        assert_eq!(
            publication(AccessLevel::None, &caps(false, false, true), &meta),
            AccessLevel::None
        );
        assert_eq!(
            publication(AccessLevel::None, &caps(false, true, false), &data),
            AccessLevel::List
        );
        assert_eq!(
            publication(AccessLevel::None, &caps(false, true, false), &meta),
            AccessLevel::List
        );
        assert_eq!(
            publication(AccessLevel::Write, &caps(false, true, true), &data),
            AccessLevel::Write
        );
        assert_eq!(
            publication(AccessLevel::None, &caps(false, true, true), &private),
            AccessLevel::None
        );
    }

    #[test]
    fn test_lifecycle_clamp() {
        let read_only = collection(LifecycleStatus::ReadOnly, PublicationMode::Private);
        let archived = collection(LifecycleStatus::Archived, PublicationMode::Private);
        let mut deleted = collection(LifecycleStatus::Active, PublicationMode::Private);
        deleted.date_deleted = Some(Utc::now());

        assert_eq!(
            lifecycle_clamp(AccessLevel::Write, &read_only, false, false),
            AccessLevel::Read
        );
        assert_eq!(
            lifecycle_clamp(AccessLevel::Write, &archived, false, false),
            AccessLevel::List
        );
        assert_eq!(
            lifecycle_clamp(AccessLevel::Read, &deleted, false, false),
            AccessLevel::None
        );
        assert_eq!(
            lifecycle_clamp(AccessLevel::Manage, &deleted, false, false),
            AccessLevel::Manage
        );
        assert_eq!(
            lifecycle_clamp(AccessLevel::Manage, &deleted, false, true),
            AccessLevel::List
        );

        let active = collection(LifecycleStatus::Active, PublicationMode::Private);
        assert_eq!(
            lifecycle_clamp(AccessLevel::Write, &active, true, false),
            AccessLevel::None
        );
    }

    #[test]
    fn test_admin_recovery() {
        assert_eq!(
            admin_recovery(AccessLevel::None, &caps(true, false, false)),
            AccessLevel::Write
        );
        assert_eq!(
            admin_recovery(AccessLevel::None, &caps(false, false, false)),
            AccessLevel::None
        );
        assert_eq!(
            admin_recovery(AccessLevel::List, &caps(true, false, false)),
            AccessLevel::List
        );
    }
}
