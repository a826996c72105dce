//! In-memory metadata graph.
//!
//! Nodes are resources and principals; edges are permission grants and
//! workspace memberships (the latter stored on the principal node). Live
//! resources are additionally indexed by path in an ordered map so that
//! subtree queries are range scans.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use graphfs_core::types::{PrincipalId, ResourceId};
use graphfs_core::{AppError, AppResult};
use graphfs_entity::resource::path;
use graphfs_entity::{AccessLevel, GrantEdge, Principal, Resource, highest_level};

use crate::mutation::Mutation;

/// The complete metadata graph.
#[derive(Debug, Default, Clone)]
pub struct GraphState {
    resources: HashMap<ResourceId, Resource>,
    live_paths: BTreeMap<String, ResourceId>,
    principals: HashMap<PrincipalId, Principal>,
    grants: HashMap<ResourceId, BTreeMap<PrincipalId, BTreeSet<GrantEdge>>>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Resource queries ─────────────────────────────────────────────

    /// Any resource by id, tombstones included.
    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// The live resource at `path`.
    pub fn live_by_path(&self, path: &str) -> Option<&Resource> {
        self.live_paths
            .get(path)
            .and_then(|id| self.resources.get(id))
    }

    /// The most recently deleted (and not since moved) resource at `path`.
    pub fn deleted_by_path(&self, path: &str) -> Option<&Resource> {
        self.resources
            .values()
            .filter(|r| r.path == path && r.is_deleted() && !r.is_moved())
            .max_by_key(|r| r.date_deleted)
    }

    /// Live resources strictly below `path`, in path order.
    pub fn live_descendants(&self, path: &str) -> Vec<&Resource> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        self.live_paths
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .filter_map(|(_, id)| self.resources.get(id))
            .collect()
    }

    /// Live immediate children of `path`, in path order.
    pub fn live_children(&self, path: &str) -> Vec<&Resource> {
        self.live_descendants(path)
            .into_iter()
            .filter(|r| path::is_child(&r.path, path))
            .collect()
    }

    /// Most recent tombstone per immediate child path of `path`, skipping
    /// paths currently held by a live resource.
    pub fn deleted_children(&self, path: &str) -> Vec<&Resource> {
        let mut latest: BTreeMap<&str, &Resource> = BTreeMap::new();
        for resource in self.resources.values() {
            if !resource.is_deleted()
                || resource.is_moved()
                || !path::is_child(&resource.path, path)
                || self.live_paths.contains_key(&resource.path)
            {
                continue;
            }
            let newer = latest
                .get(resource.path.as_str())
                .is_none_or(|seen| seen.date_deleted < resource.date_deleted);
            if newer {
                latest.insert(resource.path.as_str(), resource);
            }
        }
        latest.into_values().collect()
    }

    /// Tombstones strictly below `path` that were deleted together with it.
    pub fn deleted_descendants(&self, deleted: &Resource) -> Vec<&Resource> {
        let mut found: Vec<&Resource> = self
            .resources
            .values()
            .filter(|r| {
                path::is_descendant(&r.path, &deleted.path)
                    && !r.is_moved()
                    && r.date_deleted == deleted.date_deleted
            })
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    /// Number of resource nodes, tombstones included.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Number of live resources.
    pub fn live_count(&self) -> usize {
        self.live_paths.len()
    }

    /// Iterate all resource nodes.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    // ── Principal queries ────────────────────────────────────────────

    pub fn principal(&self, id: &PrincipalId) -> Option<&Principal> {
        self.principals.get(id)
    }

    /// Iterate all principal nodes.
    pub fn principals(&self) -> impl Iterator<Item = &Principal> {
        self.principals.values()
    }

    // ── Grant queries ────────────────────────────────────────────────

    /// Permission edges from `principal` to `resource`.
    pub fn edges(&self, principal: &PrincipalId, resource: &ResourceId) -> Vec<GrantEdge> {
        self.grants
            .get(resource)
            .and_then(|by_principal| by_principal.get(principal))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Highest level granted directly to `principal` on `resource`.
    pub fn granted_level(&self, principal: &PrincipalId, resource: &ResourceId) -> AccessLevel {
        self.grants
            .get(resource)
            .and_then(|by_principal| by_principal.get(principal))
            .map(|set| highest_level(set.iter()))
            .unwrap_or(AccessLevel::None)
    }

    /// Every principal holding an edge on `resource`, with their highest level.
    pub fn grants_on(&self, resource: &ResourceId) -> Vec<(PrincipalId, AccessLevel)> {
        self.grants
            .get(resource)
            .map(|by_principal| {
                by_principal
                    .iter()
                    .filter(|(_, set)| !set.is_empty())
                    .map(|(p, set)| (p.clone(), highest_level(set.iter())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every edge on `resource` as `(principal, edge)` pairs.
    pub fn edges_on(&self, resource: &ResourceId) -> Vec<(PrincipalId, GrantEdge)> {
        self.grants
            .get(resource)
            .map(|by_principal| {
                by_principal
                    .iter()
                    .flat_map(|(p, set)| set.iter().map(move |e| (p.clone(), *e)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every grant edge as `(principal, resource, edge)` triples.
    pub fn grant_triples(&self) -> Vec<(PrincipalId, ResourceId, GrantEdge)> {
        let mut out = Vec::new();
        for (resource, by_principal) in &self.grants {
            for (principal, set) in by_principal {
                for edge in set {
                    out.push((principal.clone(), *resource, *edge));
                }
            }
        }
        out
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Apply a mutation in place and return its inverse.
    ///
    /// Fails without touching the graph if a live resource would shadow a
    /// different live resource at the same path.
    pub fn apply(&mut self, mutation: Mutation) -> AppResult<Mutation> {
        match mutation {
            Mutation::PutResource { resource } => {
                if resource.is_live() {
                    if let Some(existing) = self.live_paths.get(&resource.path) {
                        if *existing != resource.id {
                            return Err(AppError::conflict(format!(
                                "A live resource already exists at '{}'",
                                resource.path
                            )));
                        }
                    }
                }
                let id = resource.id;
                if resource.is_live() {
                    self.live_paths.insert(resource.path.clone(), id);
                }
                let previous = self.resources.insert(id, resource);
                if let Some(prev) = &previous {
                    let still_indexed = self
                        .resources
                        .get(&id)
                        .is_some_and(|now| now.is_live() && now.path == prev.path);
                    if prev.is_live() && !still_indexed {
                        self.unindex(&prev.path, &id);
                    }
                }
                Ok(match previous {
                    Some(resource) => Mutation::PutResource { resource },
                    None => Mutation::RemoveResource { id },
                })
            }
            Mutation::RemoveResource { id } => match self.resources.remove(&id) {
                Some(resource) => {
                    if resource.is_live() {
                        self.unindex(&resource.path, &id);
                    }
                    Ok(Mutation::PutResource { resource })
                }
                None => Ok(Mutation::RemoveResource { id }),
            },
            Mutation::PutPrincipal { principal } => {
                let id = principal.id.clone();
                Ok(match self.principals.insert(id.clone(), principal) {
                    Some(principal) => Mutation::PutPrincipal { principal },
                    None => Mutation::RemovePrincipal { id },
                })
            }
            Mutation::RemovePrincipal { id } => Ok(match self.principals.remove(&id) {
                Some(principal) => Mutation::PutPrincipal { principal },
                None => Mutation::RemovePrincipal { id },
            }),
            Mutation::AddGrant {
                principal,
                resource,
                edge,
            } => {
                let inserted = self
                    .grants
                    .entry(resource)
                    .or_default()
                    .entry(principal.clone())
                    .or_default()
                    .insert(edge);
                Ok(if inserted {
                    Mutation::RemoveGrant {
                        principal,
                        resource,
                        edge,
                    }
                } else {
                    Mutation::AddGrant {
                        principal,
                        resource,
                        edge,
                    }
                })
            }
            Mutation::RemoveGrant {
                principal,
                resource,
                edge,
            } => {
                let removed = self
                    .grants
                    .get_mut(&resource)
                    .and_then(|by_principal| by_principal.get_mut(&principal))
                    .is_some_and(|set| set.remove(&edge));
                if removed {
                    self.prune_grants(&resource, &principal);
                }
                Ok(if removed {
                    Mutation::AddGrant {
                        principal,
                        resource,
                        edge,
                    }
                } else {
                    Mutation::RemoveGrant {
                        principal,
                        resource,
                        edge,
                    }
                })
            }
        }
    }

    fn unindex(&mut self, path: &str, id: &ResourceId) {
        if self.live_paths.get(path) == Some(id) {
            self.live_paths.remove(path);
        }
    }

    fn prune_grants(&mut self, resource: &ResourceId, principal: &PrincipalId) {
        if let Some(by_principal) = self.grants.get_mut(resource) {
            if by_principal.get(principal).is_some_and(BTreeSet::is_empty) {
                by_principal.remove(principal);
            }
            if by_principal.is_empty() {
                self.grants.remove(resource);
            }
        }
    }
}
