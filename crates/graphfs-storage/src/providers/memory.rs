//! In-memory blob store, used by tests and ephemeral servers.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use futures::stream::StreamExt;

use graphfs_core::error::{AppError, ErrorKind};
use graphfs_core::result::AppResult;
use graphfs_core::traits::{BlobInfo, BlobStore, ByteStream};
use graphfs_core::types::BlobId;

use crate::digest::ContentDigest;

#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<BlobId, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn store(&self, mut stream: ByteStream) -> AppResult<BlobInfo> {
        let mut digest = ContentDigest::new();
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            digest.update(&chunk);
            buf.extend_from_slice(&chunk);
        }
        let info = digest.finish();
        self.blobs
            .entry(info.id.clone())
            .or_insert_with(|| buf.freeze());
        Ok(info)
    }

    async fn read(&self, id: &BlobId) -> AppResult<ByteStream> {
        let data = self
            .blobs
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {id}")))?;
        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    async fn exists(&self, id: &BlobId) -> AppResult<bool> {
        Ok(self.blobs.contains_key(id))
    }
}
