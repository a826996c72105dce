//! Moving and copying subtrees.
//!
//! Both operations mint new subjects at the destination. A move leaves the
//! old subjects behind as tombstones that redirect to their replacements; a
//! copy leaves the source untouched and records the copier as creator.

use chrono::{DateTime, Utc};
use tracing::info;

use graphfs_core::types::{PrincipalId, ResourceId};
use graphfs_core::{AppError, AppResult};
use graphfs_entity::resource::path;
use graphfs_entity::{AccessLevel, GrantEdge, Resource};
use graphfs_graph::{GraphState, Mutation, RequestContext};

use crate::info::WriteOutcome;
use crate::service::{Vfs, apply_all, target, tombstone_subtree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relocation {
    Move,
    Copy,
}

impl Relocation {
    fn verb(self) -> &'static str {
        match self {
            Self::Move => "Moving",
            Self::Copy => "Copying",
        }
    }
}

/// Validated endpoints of a move or copy.
struct Plan {
    source: Resource,
    destination: String,
    /// Collection the copies belong to, unless they form a new collection.
    collection: Option<ResourceId>,
    /// Tombstones for a replaced destination.
    replaced: Vec<Mutation>,
}

impl Vfs {
    /// Move the subtree at `from` to `to`.
    ///
    /// Collections stay at the top level and everything else below it. An
    /// existing destination is replaced only when `overwrite` is set.
    /// Requires Write on both sides.
    pub fn move_resource(
        &self,
        ctx: &mut RequestContext,
        from: &str,
        to: &str,
        overwrite: bool,
    ) -> AppResult<WriteOutcome> {
        self.relocate(ctx, from, to, overwrite, Relocation::Move)
    }

    /// Copy the subtree at `from` to `to`, sharing blob references.
    ///
    /// A copied collection is a new collection managed by the copier.
    pub fn copy(
        &self,
        ctx: &mut RequestContext,
        from: &str,
        to: &str,
        overwrite: bool,
    ) -> AppResult<WriteOutcome> {
        self.relocate(ctx, from, to, overwrite, Relocation::Copy)
    }

    fn relocate(
        &self,
        ctx: &mut RequestContext,
        from: &str,
        to: &str,
        overwrite: bool,
        kind: Relocation,
    ) -> AppResult<WriteOutcome> {
        let me = ctx.principal().clone();
        let now = Utc::now();
        let plan = self.plan(ctx, from, to, overwrite, &me, now)?;
        let created = plan.replaced.is_empty();

        let graph = ctx.graph()?;
        let subtree: Vec<Resource> = std::iter::once(&plan.source)
            .chain(graph.live_descendants(&plan.source.path))
            .cloned()
            .collect();

        let mut mutations = plan.replaced;
        let mut root_copy: Option<Resource> = None;
        let mut new_collection = plan.collection;
        for original in &subtree {
            let new_path = path::rebase(&original.path, &plan.source.path, &plan.destination);
            let mut copy = original.relocated(new_path, new_collection);
            if root_copy.is_none() && copy.is_collection() {
                new_collection = Some(copy.id);
            }
            match kind {
                Relocation::Move => {
                    copy.touch(&me, now);
                    let mut redirect = original.clone();
                    redirect.moved_to = Some(copy.id);
                    mutations.push(Mutation::PutResource { resource: redirect });
                }
                Relocation::Copy => {
                    copy.created_by = me.clone();
                    copy.date_created = now;
                    copy.touch(&me, now);
                }
            }
            mutations.push(Mutation::PutResource {
                resource: copy.clone(),
            });
            root_copy.get_or_insert(copy);
        }

        let root_copy = root_copy.ok_or_else(|| AppError::internal("Empty relocation"))?;
        if root_copy.is_collection() {
            mutations.extend(collection_grants(graph, &plan.source, &root_copy, &me, kind));
        }

        let message = format!(
            "{} {} to {}",
            kind.verb(),
            plan.source.path,
            plan.destination
        );
        let count = subtree.len();
        apply_all(ctx, mutations, message)?;

        info!(
            principal = %me,
            from = %plan.source.path,
            to = %plan.destination,
            resources = count,
            replaced = !created,
            "{} subtree", kind.verb()
        );
        Ok(WriteOutcome {
            info: self.describe_for(ctx, &root_copy)?,
            created,
        })
    }

    fn plan(
        &self,
        ctx: &RequestContext,
        from: &str,
        to: &str,
        overwrite: bool,
        me: &PrincipalId,
        now: DateTime<Utc>,
    ) -> AppResult<Plan> {
        let from = target(from)?;
        let to = target(to)?;
        if from == to {
            return Err(AppError::validation("Source and destination are the same"));
        }
        if path::is_descendant(&to, &from) {
            return Err(AppError::validation(format!(
                "Cannot place '{from}' inside itself"
            )));
        }
        if path::is_descendant(&from, &to) {
            return Err(AppError::validation(format!(
                "Cannot replace '{to}' with its own descendant"
            )));
        }

        let source = self.live(ctx, &from)?;
        self.checker.require(ctx, &source, AccessLevel::Write)?;
        let top_level = path::depth(&to) == 1;
        if source.is_collection() && !top_level {
            return Err(AppError::validation(
                "Collections can only be placed at the top level",
            ));
        }
        if !source.is_collection() && top_level {
            return Err(AppError::validation(
                "Only collections can be placed at the top level",
            ));
        }

        let graph = ctx.graph()?;
        let replaced = match graph.live_by_path(&to) {
            None => Vec::new(),
            Some(_) if !overwrite => {
                return Err(AppError::precondition_failed(format!(
                    "'{to}' already exists"
                )));
            }
            Some(existing) => {
                self.checker.require(ctx, existing, AccessLevel::Write)?;
                tombstone_subtree(graph, existing, me, now)
            }
        };

        let collection = if top_level {
            None
        } else {
            let parent = self.parent_container(ctx, &to)?;
            self.checker.require(ctx, &parent, AccessLevel::Write)?;
            Some(parent.collection)
        };

        Ok(Plan {
            source,
            destination: to,
            collection,
            replaced,
        })
    }
}

/// Grants for a relocated collection: a moved collection keeps every
/// edge of the original, a copied one is managed by the copier.
fn collection_grants(
    graph: &GraphState,
    source: &Resource,
    copy: &Resource,
    me: &PrincipalId,
    kind: Relocation,
) -> Vec<Mutation> {
    match kind {
        Relocation::Move => graph
            .edges_on(&source.id)
            .into_iter()
            .map(|(principal, edge)| Mutation::AddGrant {
                principal,
                resource: copy.id,
                edge,
            })
            .collect(),
        Relocation::Copy => vec![Mutation::AddGrant {
            principal: me.clone(),
            resource: copy.id,
            edge: GrantEdge::CanManage,
        }],
    }
}
