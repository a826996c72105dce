//! Resource entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use graphfs_core::traits::BlobInfo;
use graphfs_core::types::{PrincipalId, ResourceId};

use super::path;
use super::status::{LifecycleStatus, PublicationMode};

/// Type tag of a resource, with the fields only that type carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceKind {
    /// Top-level container and the unit of permission granting.
    Collection {
        /// Lifecycle state (`Deleted` is never stored here).
        status: LifecycleStatus,
        /// Publication mode.
        access_mode: PublicationMode,
        /// Workspace owning the collection, if any.
        owned_by: Option<PrincipalId>,
    },
    /// Nested container.
    Directory,
    /// Nested file with exactly one active blob reference.
    File {
        /// Current content.
        blob: BlobInfo,
    },
}

/// A collection, directory, or file subject in the graph.
///
/// Resources are never physically removed: deletion sets `date_deleted`,
/// moving sets `moved_to`. Either marker hides the subject from normal views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Subject identifier.
    pub id: ResourceId,
    /// Slash-separated path, unique among live siblings.
    pub path: String,
    /// Type tag and type-specific fields.
    pub kind: ResourceKind,
    /// Owning top-level collection (the resource itself for collections).
    pub collection: ResourceId,
    /// Free-text description.
    #[serde(default)]
    pub comment: String,
    /// Creator.
    pub created_by: PrincipalId,
    /// Creation timestamp.
    pub date_created: DateTime<Utc>,
    /// Last modifier.
    pub modified_by: PrincipalId,
    /// Last modification timestamp.
    pub date_modified: DateTime<Utc>,
    /// Deletion tombstone.
    #[serde(default)]
    pub date_deleted: Option<DateTime<Utc>>,
    /// Who deleted the resource.
    #[serde(default)]
    pub deleted_by: Option<PrincipalId>,
    /// Tombstone redirect left behind by a move.
    #[serde(default)]
    pub moved_to: Option<ResourceId>,
}

impl Resource {
    fn base(
        path: String,
        kind: ResourceKind,
        collection: Option<ResourceId>,
        creator: &PrincipalId,
        now: DateTime<Utc>,
    ) -> Self {
        let id = ResourceId::new();
        Self {
            id,
            path,
            kind,
            collection: collection.unwrap_or(id),
            comment: String::new(),
            created_by: creator.clone(),
            date_created: now,
            modified_by: creator.clone(),
            date_modified: now,
            date_deleted: None,
            deleted_by: None,
            moved_to: None,
        }
    }

    /// Create a new active, private collection.
    pub fn collection(path: impl Into<String>, creator: &PrincipalId, now: DateTime<Utc>) -> Self {
        Self::base(
            path.into(),
            ResourceKind::Collection {
                status: LifecycleStatus::Active,
                access_mode: PublicationMode::Private,
                owned_by: None,
            },
            None,
            creator,
            now,
        )
    }

    /// Create a new directory inside `collection`.
    pub fn directory(
        path: impl Into<String>,
        collection: ResourceId,
        creator: &PrincipalId,
        now: DateTime<Utc>,
    ) -> Self {
        Self::base(
            path.into(),
            ResourceKind::Directory,
            Some(collection),
            creator,
            now,
        )
    }

    /// Create a new file inside `collection` referencing `blob`.
    pub fn file(
        path: impl Into<String>,
        collection: ResourceId,
        blob: BlobInfo,
        creator: &PrincipalId,
        now: DateTime<Utc>,
    ) -> Self {
        Self::base(
            path.into(),
            ResourceKind::File { blob },
            Some(collection),
            creator,
            now,
        )
    }

    /// Copy every non-path attribute into a fresh subject at `new_path`.
    pub fn relocated(&self, new_path: String, collection: Option<ResourceId>) -> Self {
        let id = ResourceId::new();
        let collection = match self.kind {
            ResourceKind::Collection { .. } => id,
            _ => collection.unwrap_or(self.collection),
        };
        Self {
            id,
            path: new_path,
            collection,
            moved_to: None,
            ..self.clone()
        }
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        path::name(&self.path)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, ResourceKind::Collection { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, ResourceKind::File { .. })
    }

    /// Collections and directories can hold children.
    pub fn is_container(&self) -> bool {
        !self.is_file()
    }

    pub fn is_deleted(&self) -> bool {
        self.date_deleted.is_some()
    }

    pub fn is_moved(&self) -> bool {
        self.moved_to.is_some()
    }

    /// Neither deleted nor moved away.
    pub fn is_live(&self) -> bool {
        !self.is_deleted() && !self.is_moved()
    }

    /// Current blob reference, for files.
    pub fn blob(&self) -> Option<&BlobInfo> {
        match &self.kind {
            ResourceKind::File { blob } => Some(blob),
            _ => None,
        }
    }

    /// Content length; zero for containers.
    pub fn size(&self) -> u64 {
        self.blob().map(|b| b.size).unwrap_or(0)
    }

    /// Lifecycle state, reporting `Deleted` for tombstones.
    pub fn lifecycle(&self) -> LifecycleStatus {
        if self.is_deleted() {
            return LifecycleStatus::Deleted;
        }
        match &self.kind {
            ResourceKind::Collection { status, .. } => *status,
            _ => LifecycleStatus::Active,
        }
    }

    /// Publication mode; only collections are ever published.
    pub fn access_mode(&self) -> PublicationMode {
        match &self.kind {
            ResourceKind::Collection { access_mode, .. } => *access_mode,
            _ => PublicationMode::Private,
        }
    }

    /// Owning workspace, for collections.
    pub fn owned_by(&self) -> Option<&PrincipalId> {
        match &self.kind {
            ResourceKind::Collection { owned_by, .. } => owned_by.as_ref(),
            _ => None,
        }
    }

    /// Type name as stored in the graph.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ResourceKind::Collection { .. } => "Collection",
            ResourceKind::Directory => "Directory",
            ResourceKind::File { .. } => "File",
        }
    }

    /// Subject IRI under `base_iri`.
    pub fn iri(&self, base_iri: &str) -> String {
        format!("{}{}", base_iri, self.id)
    }

    /// Record a modification.
    pub fn touch(&mut self, by: &PrincipalId, now: DateTime<Utc>) {
        self.modified_by = by.clone();
        self.date_modified = now;
    }
}
