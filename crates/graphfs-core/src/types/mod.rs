//! Shared value types.

pub mod id;

pub use id::{BlobId, PrincipalId, ResourceId, TransactionId};
