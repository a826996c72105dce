//! The VFS service and the lookups its operations share.
//!
//! Operations are split by concern across sibling modules, each adding an
//! `impl Vfs` block: queries, writes, relocation, and lifecycle.

use chrono::{DateTime, Utc};

use graphfs_auth::AccessChecker;
use graphfs_core::config::GraphConfig;
use graphfs_core::types::PrincipalId;
use graphfs_core::{AppError, AppResult};
use graphfs_entity::resource::path;
use graphfs_entity::{AccessLevel, Resource};
use graphfs_graph::{GraphState, Mutation, RequestContext};

use crate::info::ResourceInfo;

/// Path-addressed file system over the metadata graph.
#[derive(Debug, Clone)]
pub struct Vfs {
    /// Access gate for every operation.
    pub(crate) checker: AccessChecker,
    /// Prefix of subject IRIs.
    pub(crate) base_iri: String,
}

impl Vfs {
    /// Creates a VFS minting subject IRIs under `base_iri`.
    pub fn new(base_iri: impl Into<String>, checker: AccessChecker) -> Self {
        Self {
            checker,
            base_iri: base_iri.into(),
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.base_iri.clone(), AccessChecker::default())
    }

    pub fn base_iri(&self) -> &str {
        &self.base_iri
    }

    pub fn checker(&self) -> &AccessChecker {
        &self.checker
    }

    // ── Shared lookups ───────────────────────────────────────────────

    /// The resource `path` resolves to under the request's view: the live
    /// resource, or with `show_deleted` the most recent tombstone.
    pub(crate) fn find<'c>(
        &self,
        ctx: &'c RequestContext,
        path: &str,
    ) -> AppResult<Option<&'c Resource>> {
        let graph = ctx.graph()?;
        if let Some(live) = graph.live_by_path(path) {
            return Ok(Some(live));
        }
        if ctx.show_deleted() {
            return Ok(graph.deleted_by_path(path));
        }
        Ok(None)
    }

    /// The live resource at `path`, cloned so that the caller may go on to
    /// mutate the graph.
    pub(crate) fn live(&self, ctx: &RequestContext, path: &str) -> AppResult<Resource> {
        ctx.graph()?
            .live_by_path(path)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No such resource: {path}")))
    }

    /// The live container that will hold a new entry at `child`.
    ///
    /// A missing, invisible, or non-container parent is a conflict, the way
    /// intermediate collections are in WebDAV.
    pub(crate) fn parent_container(&self, ctx: &RequestContext, child: &str) -> AppResult<Resource> {
        let parent_path = path::parent(child);
        let parent = ctx.graph()?.live_by_path(parent_path);
        match parent {
            Some(parent) if parent.is_container() && self.checker.can_list(ctx, parent)? => {
                Ok(parent.clone())
            }
            Some(parent) if parent.is_file() => Err(AppError::conflict(format!(
                "'{parent_path}' is a file and cannot hold children"
            ))),
            _ => Err(AppError::conflict(format!(
                "Parent '{parent_path}' does not exist"
            ))),
        }
    }

    /// Caller-facing view of `resource` for a caller holding `access`.
    pub(crate) fn describe(
        &self,
        graph: &GraphState,
        resource: &Resource,
        access: AccessLevel,
    ) -> ResourceInfo {
        let collection = graph.resource(&resource.collection);
        ResourceInfo::from_resource(resource, collection, access, &self.base_iri)
    }

    /// Describe `resource` with the caller's current access.
    pub(crate) fn describe_for(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
    ) -> AppResult<ResourceInfo> {
        let level = self.checker.level(ctx, resource)?;
        Ok(self.describe(ctx.graph()?, resource, level))
    }
}

/// Normalize and validate a path naming a resource (never the root).
pub(crate) fn target(raw: &str) -> AppResult<String> {
    let normalized = path::normalize(raw);
    path::validate(&normalized)?;
    Ok(normalized)
}

/// Apply `mutations` and record the commit message.
pub(crate) fn apply_all(
    ctx: &mut RequestContext,
    mutations: Vec<Mutation>,
    message: String,
) -> AppResult<()> {
    for mutation in mutations {
        ctx.apply(mutation)?;
    }
    ctx.set_message(message)
}

/// Tombstones for `root` and its live subtree, all sharing one timestamp
/// so that they can be restored together.
pub(crate) fn tombstone_subtree(
    graph: &GraphState,
    root: &Resource,
    by: &PrincipalId,
    now: DateTime<Utc>,
) -> Vec<Mutation> {
    std::iter::once(root)
        .chain(graph.live_descendants(&root.path))
        .map(|resource| {
            let mut tombstone = resource.clone();
            tombstone.date_deleted = Some(now);
            tombstone.deleted_by = Some(by.clone());
            Mutation::PutResource {
                resource: tombstone,
            }
        })
        .collect()
}
