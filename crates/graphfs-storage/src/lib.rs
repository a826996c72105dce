//! # graphfs-storage
//!
//! Blob store implementations for GraphFS. Blobs are addressed by the
//! BLAKE3 digest of their content and carry a SHA-256 checksum; they are
//! written before the metadata transaction that references them and are
//! never mutated afterwards.

pub mod digest;
pub mod providers;

use std::sync::Arc;

use graphfs_core::config::BlobStoreConfig;
use graphfs_core::result::AppResult;
use graphfs_core::traits::BlobStore;

pub use digest::ContentDigest;
pub use providers::local::LocalBlobStore;
pub use providers::memory::MemoryBlobStore;

/// Build the blob store described by the configuration.
pub async fn from_config(config: &BlobStoreConfig) -> AppResult<Arc<dyn BlobStore>> {
    Ok(Arc::new(LocalBlobStore::new(&config.path).await?))
}
