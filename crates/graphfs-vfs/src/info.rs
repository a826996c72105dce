//! Caller-facing views of resources.

use chrono::{DateTime, Utc};
use serde::Serialize;

use graphfs_core::traits::BlobInfo;
use graphfs_core::types::{PrincipalId, ResourceId};
use graphfs_entity::{AccessLevel, LifecycleStatus, PublicationMode, Resource, ResourceKind};

/// What a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    /// The VFS root; it lists collections and has no metadata of its own.
    Root,
    Collection,
    Directory,
    File,
}

impl EntryKind {
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::File)
    }
}

/// Metadata of one entry, as seen by the requesting principal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    /// Subject id; `None` for the root.
    pub id: Option<ResourceId>,
    /// Subject IRI (the base IRI for the root).
    pub iri: String,
    /// Normalized path.
    pub path: String,
    /// Display name (last path segment).
    pub name: String,
    pub kind: EntryKind,
    /// Content length in bytes.
    pub size: u64,
    /// Current blob reference, for files.
    pub blob: Option<BlobInfo>,
    pub comment: String,
    pub created_by: Option<PrincipalId>,
    pub date_created: Option<DateTime<Utc>>,
    pub modified_by: Option<PrincipalId>,
    pub date_modified: Option<DateTime<Utc>>,
    pub deleted_by: Option<PrincipalId>,
    pub date_deleted: Option<DateTime<Utc>>,
    /// Lifecycle status of the owning collection (or `Deleted`).
    pub status: LifecycleStatus,
    pub access_mode: PublicationMode,
    pub owned_by: Option<PrincipalId>,
    /// The caller's effective access on this entry.
    pub access: AccessLevel,
}

impl ResourceInfo {
    /// The root entry. Everyone may list it.
    pub fn root(base_iri: &str) -> Self {
        Self {
            id: None,
            iri: base_iri.to_string(),
            path: String::new(),
            name: String::new(),
            kind: EntryKind::Root,
            size: 0,
            blob: None,
            comment: String::new(),
            created_by: None,
            date_created: None,
            modified_by: None,
            date_modified: None,
            deleted_by: None,
            date_deleted: None,
            status: LifecycleStatus::Active,
            access_mode: PublicationMode::Private,
            owned_by: None,
            access: AccessLevel::List,
        }
    }

    /// View of `resource` for a caller holding `access`.
    ///
    /// `status` and `access_mode` are taken from `collection`, the resource's
    /// owning collection, so every entry reports the state that governs it.
    pub fn from_resource(
        resource: &Resource,
        collection: Option<&Resource>,
        access: AccessLevel,
        base_iri: &str,
    ) -> Self {
        let kind = match resource.kind {
            ResourceKind::Collection { .. } => EntryKind::Collection,
            ResourceKind::Directory => EntryKind::Directory,
            ResourceKind::File { .. } => EntryKind::File,
        };
        let governing = collection.unwrap_or(resource);
        let status = if resource.is_deleted() {
            LifecycleStatus::Deleted
        } else {
            governing.lifecycle()
        };

        Self {
            id: Some(resource.id),
            iri: resource.iri(base_iri),
            path: resource.path.clone(),
            name: resource.name().to_string(),
            kind,
            size: resource.size(),
            blob: resource.blob().cloned(),
            comment: resource.comment.clone(),
            created_by: Some(resource.created_by.clone()),
            date_created: Some(resource.date_created),
            modified_by: Some(resource.modified_by.clone()),
            date_modified: Some(resource.date_modified),
            deleted_by: resource.deleted_by.clone(),
            date_deleted: resource.date_deleted,
            status,
            access_mode: governing.access_mode(),
            owned_by: governing.owned_by().cloned(),
            access,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn is_deleted(&self) -> bool {
        self.date_deleted.is_some()
    }

    /// Opaque validator derived from id and modification time.
    pub fn etag(&self) -> Option<String> {
        let id = self.id?;
        let modified = self.date_modified?;
        Some(format!("\"{}-{}\"", id.into_uuid().simple(), modified.timestamp_millis()))
    }
}

/// Result of an operation that creates or replaces a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub info: ResourceInfo,
    /// `false` when an existing resource was replaced.
    pub created: bool,
}

/// Requested property changes. `None` leaves a property untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyUpdate {
    pub comment: Option<String>,
    pub status: Option<LifecycleStatus>,
    pub access_mode: Option<PublicationMode>,
}

impl PropertyUpdate {
    pub fn is_empty(&self) -> bool {
        self.comment.is_none() && self.status.is_none() && self.access_mode.is_none()
    }

    /// Whether lifecycle-managing properties are touched.
    pub fn touches_lifecycle(&self) -> bool {
        self.status.is_some() || self.access_mode.is_some()
    }
}
