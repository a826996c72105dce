//! Read-only operations: stat, list, read.

use graphfs_core::{AppError, AppResult};
use graphfs_entity::AccessLevel;
use graphfs_entity::resource::path;
use graphfs_graph::RequestContext;

use crate::info::ResourceInfo;
use crate::service::Vfs;

impl Vfs {
    /// Metadata of the entry at `path`, or `None` when it does not exist or
    /// the caller may not see it.
    pub fn stat(&self, ctx: &RequestContext, raw_path: &str) -> AppResult<Option<ResourceInfo>> {
        let path = path::normalize(raw_path);
        if path.is_empty() {
            return Ok(Some(ResourceInfo::root(&self.base_iri)));
        }

        let Some(resource) = self.find(ctx, &path)? else {
            return Ok(None);
        };
        let level = self.checker.level(ctx, resource)?;
        if !level.can_list() {
            return Ok(None);
        }
        Ok(Some(self.describe(ctx.graph()?, resource, level)))
    }

    /// Immediate children of the container at `path` that the caller may
    /// list, in path order.
    ///
    /// The root lists collections. With `show_deleted` the most recent
    /// tombstone of each vacant child path is included. Files have no
    /// children.
    pub fn list(&self, ctx: &RequestContext, raw_path: &str) -> AppResult<Vec<ResourceInfo>> {
        let path = path::normalize(raw_path);
        if !path.is_empty() {
            let parent = self
                .find(ctx, &path)?
                .ok_or_else(|| AppError::not_found(format!("No such resource: {path}")))?;
            if !self.checker.can_list(ctx, parent)? {
                return Err(AppError::not_found(format!("No such resource: {path}")));
            }
            if parent.is_file() {
                return Ok(Vec::new());
            }
        }

        let graph = ctx.graph()?;
        let mut children = graph.live_children(&path);
        if ctx.show_deleted() {
            children.extend(graph.deleted_children(&path));
            children.sort_by(|a, b| a.path.cmp(&b.path));
        }

        let mut entries = Vec::with_capacity(children.len());
        for child in children {
            let level = self.checker.level(ctx, child)?;
            if level.can_list() {
                entries.push(self.describe(graph, child, level));
            }
        }
        Ok(entries)
    }

    /// Metadata of the file at `path` including its blob reference.
    /// Requires Read.
    pub fn read(&self, ctx: &RequestContext, raw_path: &str) -> AppResult<ResourceInfo> {
        let path = path::normalize(raw_path);
        let resource = self
            .find(ctx, &path)?
            .ok_or_else(|| AppError::not_found(format!("No such resource: {path}")))?;
        let level = self.checker.require(ctx, resource, AccessLevel::Read)?;
        if !resource.is_file() {
            return Err(AppError::validation(format!("'{path}' is not a file")));
        }
        Ok(self.describe(ctx.graph()?, resource, level))
    }
}
