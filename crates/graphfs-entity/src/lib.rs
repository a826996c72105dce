//! # graphfs-entity
//!
//! Typed graph models for GraphFS. Every struct in this crate is a node or
//! edge of the metadata graph: resources (collections, directories, files),
//! principals (users and workspaces), and the permission edges between them.
//! All entities derive `Debug`, `Clone`, `Serialize`, and `Deserialize` so
//! that they can be recorded in the transaction log verbatim.

pub mod permission;
pub mod principal;
pub mod resource;

pub use permission::{AccessLevel, GrantEdge, highest_level};
pub use principal::{Capabilities, MembershipRole, Principal, PrincipalKind};
pub use resource::{LifecycleStatus, PublicationMode, Resource, ResourceKind};
