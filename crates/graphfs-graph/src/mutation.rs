//! Mutation records.
//!
//! Every change to the graph is expressed as a [`Mutation`]. Applying one
//! yields its inverse, which is how aborted transactions are rolled back;
//! the forward records of committed transactions go to the write-ahead log.

use serde::{Deserialize, Serialize};

use graphfs_core::types::{PrincipalId, ResourceId};
use graphfs_entity::{GrantEdge, Principal, Resource};

/// A single graph change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert or replace a resource node.
    PutResource {
        /// The full node.
        resource: Resource,
    },
    /// Drop a resource node. Only produced as the inverse of an insert.
    RemoveResource {
        /// Node to drop.
        id: ResourceId,
    },
    /// Insert or replace a principal node.
    PutPrincipal {
        /// The full node.
        principal: Principal,
    },
    /// Drop a principal node. Only produced as the inverse of an insert.
    RemovePrincipal {
        /// Node to drop.
        id: PrincipalId,
    },
    /// Add a permission edge.
    AddGrant {
        /// Grantee.
        principal: PrincipalId,
        /// Target collection.
        resource: ResourceId,
        /// Edge predicate.
        edge: GrantEdge,
    },
    /// Remove a permission edge.
    RemoveGrant {
        /// Grantee.
        principal: PrincipalId,
        /// Target collection.
        resource: ResourceId,
        /// Edge predicate.
        edge: GrantEdge,
    },
}

impl Mutation {
    /// Short name for logging.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::PutResource { .. } => "put_resource",
            Self::RemoveResource { .. } => "remove_resource",
            Self::PutPrincipal { .. } => "put_principal",
            Self::RemovePrincipal { .. } => "remove_principal",
            Self::AddGrant { .. } => "add_grant",
            Self::RemoveGrant { .. } => "remove_grant",
        }
    }
}
