//! # graphfs-vfs
//!
//! A hierarchical file system over the metadata graph. Paths are
//! slash-separated with the empty string as the root; top-level entries are
//! collections, everything below them directories and files. Every
//! operation runs inside the transaction bound to the caller's
//! [`RequestContext`](graphfs_graph::RequestContext) and is gated by the
//! caller's effective access on the owning collection.
//!
//! File content never passes through this crate: writes record a blob
//! reference that was stored beforehand, reads hand one back.

pub mod info;
pub mod service;

mod lifecycle;
mod query;
mod relocate;
mod write;

#[cfg(test)]
mod testing;

pub use info::{EntryKind, PropertyUpdate, ResourceInfo, WriteOutcome};
pub use service::Vfs;
