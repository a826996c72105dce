//! Creating collections, directories, and files.

use chrono::Utc;
use tracing::info;

use graphfs_core::traits::BlobInfo;
use graphfs_core::{AppError, AppResult};
use graphfs_entity::resource::path;
use graphfs_entity::{AccessLevel, GrantEdge, Resource, ResourceKind};
use graphfs_graph::{Mutation, RequestContext};

use crate::info::{ResourceInfo, WriteOutcome};
use crate::service::{Vfs, apply_all, target};

impl Vfs {
    /// Create a container at `path`.
    ///
    /// A top-level path creates a collection and grants its creator Manage
    /// on it. Deeper paths create a directory inside a live container on
    /// which the caller holds Write.
    pub fn mkdir(&self, ctx: &mut RequestContext, raw_path: &str) -> AppResult<ResourceInfo> {
        let path = target(raw_path)?;
        if ctx.graph()?.live_by_path(&path).is_some() {
            return Err(AppError::conflict(format!("'{path}' already exists")));
        }

        let me = ctx.principal().clone();
        let now = Utc::now();
        let (created, mut mutations, message) = if path::depth(&path) == 1 {
            let collection = Resource::collection(path.clone(), &me, now);
            let grant = Mutation::AddGrant {
                principal: me.clone(),
                resource: collection.id,
                edge: GrantEdge::CanManage,
            };
            (collection, vec![grant], format!("Creating collection {path}"))
        } else {
            let parent = self.parent_container(ctx, &path)?;
            self.checker.require(ctx, &parent, AccessLevel::Write)?;
            let directory = Resource::directory(path.clone(), parent.collection, &me, now);
            (directory, Vec::new(), format!("Creating directory {path}"))
        };

        mutations.insert(
            0,
            Mutation::PutResource {
                resource: created.clone(),
            },
        );
        apply_all(ctx, mutations, message)?;

        info!(principal = %me, path = %path, kind = created.type_name(), "Container created");
        self.describe_for(ctx, &created)
    }

    /// Point the file at `path` to `blob`, creating it if needed.
    ///
    /// The blob must already be in the blob store. Replacing a file keeps its
    /// identity and provenance and records the modification; the previous
    /// blob is no longer referenced.
    pub fn write(
        &self,
        ctx: &mut RequestContext,
        raw_path: &str,
        blob: BlobInfo,
    ) -> AppResult<WriteOutcome> {
        let path = target(raw_path)?;
        let me = ctx.principal().clone();
        let now = Utc::now();

        let existing = ctx.graph()?.live_by_path(&path).cloned();
        let (file, created) = match existing {
            Some(mut file) => {
                self.checker.require(ctx, &file, AccessLevel::Write)?;
                if !file.is_file() {
                    return Err(AppError::conflict(format!(
                        "'{path}' is a {} and cannot hold content",
                        file.type_name().to_lowercase()
                    )));
                }
                file.kind = ResourceKind::File { blob };
                file.touch(&me, now);
                (file, false)
            }
            None => {
                if path::depth(&path) == 1 {
                    return Err(AppError::validation(
                        "Files can only be stored inside a collection",
                    ));
                }
                let parent = self.parent_container(ctx, &path)?;
                self.checker.require(ctx, &parent, AccessLevel::Write)?;
                (Resource::file(path.clone(), parent.collection, blob, &me, now), true)
            }
        };

        let verb = if created { "Creating" } else { "Updating" };
        apply_all(
            ctx,
            vec![Mutation::PutResource {
                resource: file.clone(),
            }],
            format!("{verb} file {path}"),
        )?;

        info!(principal = %me, path = %path, size = file.size(), created, "File written");
        Ok(WriteOutcome {
            info: self.describe_for(ctx, &file)?,
            created,
        })
    }
}
