//! Deletion, restoration, properties, and access grants.

use chrono::Utc;
use tracing::info;

use graphfs_core::types::PrincipalId;
use graphfs_core::{AppError, AppResult};
use graphfs_entity::resource::path;
use graphfs_entity::{AccessLevel, GrantEdge, LifecycleStatus, ResourceKind};
use graphfs_graph::{Mutation, RequestContext};

use crate::info::{PropertyUpdate, ResourceInfo};
use crate::service::{Vfs, apply_all, target, tombstone_subtree};

impl Vfs {
    /// Tombstone the resource at `path` and its live subtree. Requires Write.
    ///
    /// Returns the number of resources tombstoned.
    pub fn delete(&self, ctx: &mut RequestContext, raw_path: &str) -> AppResult<usize> {
        let path = target(raw_path)?;
        let resource = self.live(ctx, &path)?;
        self.checker.require(ctx, &resource, AccessLevel::Write)?;

        let me = ctx.principal().clone();
        let mutations = tombstone_subtree(ctx.graph()?, &resource, &me, Utc::now());
        let count = mutations.len();
        apply_all(ctx, mutations, format!("Deleting {path}"))?;

        info!(principal = %me, path = %path, resources = count, "Resource deleted");
        Ok(count)
    }

    /// Restore the most recently deleted resource at `path` together with
    /// everything deleted alongside it. Requires Manage.
    ///
    /// Descendants whose path has since been taken by a live resource stay
    /// deleted. Returns the number of resources restored.
    pub fn undelete(&self, ctx: &mut RequestContext, raw_path: &str) -> AppResult<usize> {
        let path = target(raw_path)?;
        let graph = ctx.graph()?;
        if graph.live_by_path(&path).is_some() {
            return Err(AppError::conflict(format!(
                "A live resource already exists at '{path}'"
            )));
        }
        let deleted = graph
            .deleted_by_path(&path)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No deleted resource at {path}")))?;
        self.checker
            .require_management(ctx, &deleted, AccessLevel::Manage)?;
        if path::depth(&path) > 1 {
            self.parent_container(ctx, &path)?;
        }

        let me = ctx.principal().clone();
        let now = Utc::now();
        let graph = ctx.graph()?;
        let mutations: Vec<Mutation> = std::iter::once(&deleted)
            .chain(graph.deleted_descendants(&deleted))
            .filter(|r| graph.live_by_path(&r.path).is_none())
            .map(|r| {
                let mut restored = r.clone();
                restored.date_deleted = None;
                restored.deleted_by = None;
                restored.touch(&me, now);
                Mutation::PutResource { resource: restored }
            })
            .collect();
        let count = mutations.len();
        apply_all(ctx, mutations, format!("Restoring {path}"))?;

        info!(principal = %me, path = %path, resources = count, "Resource restored");
        Ok(count)
    }

    /// Change the comment (Write), or a collection's status or publication
    /// mode (Manage).
    pub fn set_properties(
        &self,
        ctx: &mut RequestContext,
        raw_path: &str,
        update: PropertyUpdate,
    ) -> AppResult<ResourceInfo> {
        let path = target(raw_path)?;
        let mut resource = self.live(ctx, &path)?;
        if update.is_empty() {
            return self.describe_for(ctx, &resource);
        }

        if update.touches_lifecycle() {
            if !resource.is_collection() {
                return Err(AppError::validation(
                    "Status and access mode can only be set on collections",
                ));
            }
            if update.status == Some(LifecycleStatus::Deleted) {
                return Err(AppError::validation(
                    "Use delete to remove a collection",
                ));
            }
            self.checker
                .require_management(ctx, &resource, AccessLevel::Manage)?;
        }
        if update.comment.is_some() {
            self.checker.require(ctx, &resource, AccessLevel::Write)?;
        }

        if let Some(comment) = update.comment {
            resource.comment = comment;
        }
        if let ResourceKind::Collection {
            status,
            access_mode,
            ..
        } = &mut resource.kind
        {
            if let Some(new_status) = update.status {
                *status = new_status;
            }
            if let Some(new_mode) = update.access_mode {
                *access_mode = new_mode;
            }
        }
        let me = ctx.principal().clone();
        resource.touch(&me, Utc::now());

        apply_all(
            ctx,
            vec![Mutation::PutResource {
                resource: resource.clone(),
            }],
            format!("Updating properties of {path}"),
        )?;

        info!(
            principal = %me,
            path = %path,
            status = %resource.lifecycle(),
            access_mode = %resource.access_mode(),
            "Properties updated"
        );
        self.describe_for(ctx, &resource)
    }

    /// Set `principal`'s grant on the collection at `path` to exactly
    /// `level`; `AccessLevel::None` revokes. Requires Manage.
    pub fn set_access(
        &self,
        ctx: &mut RequestContext,
        raw_path: &str,
        principal: impl Into<PrincipalId>,
        level: AccessLevel,
    ) -> AppResult<()> {
        let principal = principal.into();
        let path = target(raw_path)?;
        let collection = self.live(ctx, &path)?;
        if !collection.is_collection() {
            return Err(AppError::validation(
                "Access can only be granted on collections",
            ));
        }
        self.checker
            .require_management(ctx, &collection, AccessLevel::Manage)?;

        let graph = ctx.graph()?;
        if graph.principal(&principal).is_none() {
            return Err(AppError::validation(format!(
                "Unknown principal: {principal}"
            )));
        }

        let wanted = GrantEdge::for_level(level);
        let current = graph.edges(&principal, &collection.id);
        let mut mutations: Vec<Mutation> = current
            .iter()
            .filter(|edge| Some(**edge) != wanted)
            .map(|edge| Mutation::RemoveGrant {
                principal: principal.clone(),
                resource: collection.id,
                edge: *edge,
            })
            .collect();
        if let Some(edge) = wanted.filter(|edge| !current.contains(edge)) {
            mutations.push(Mutation::AddGrant {
                principal: principal.clone(),
                resource: collection.id,
                edge,
            });
        }

        apply_all(
            ctx,
            mutations,
            format!("Setting {level} access for {principal} on {path}"),
        )?;
        info!(grantee = %principal, path = %path, %level, "Access updated");
        Ok(())
    }
}
