//! Blob store trait for content-addressed binary payloads.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;
use crate::types::id::BlobId;

/// A byte stream type used for payload transfer in both directions.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Reference to stored content: its address, length, and integrity checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobInfo {
    /// Content address.
    pub id: BlobId,
    /// Number of bytes actually stored.
    pub size: u64,
    /// SHA-256 of the content, lowercase hex.
    pub checksum_sha256: String,
}

/// Trait for blob storage backends.
///
/// Content identifiers are immutable once stored, so implementations are
/// shared freely across concurrent readers and writers. Storing the same
/// bytes twice yields the same [`BlobInfo`].
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type name (e.g., "local", "memory").
    fn store_type(&self) -> &str;

    /// Check whether the store is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Consume the stream completely and store its bytes.
    async fn store(&self, stream: ByteStream) -> AppResult<BlobInfo>;

    /// Open the content of a stored blob as a byte stream.
    async fn read(&self, id: &BlobId) -> AppResult<ByteStream>;

    /// Check whether a blob with this address exists.
    async fn exists(&self, id: &BlobId) -> AppResult<bool>;

    /// Store an in-memory buffer.
    async fn store_bytes(&self, data: Bytes) -> AppResult<BlobInfo> {
        let stream: ByteStream = Box::pin(futures::stream::once(async move { Ok(data) }));
        self.store(stream).await
    }

    /// Read a whole blob into memory.
    async fn read_bytes(&self, id: &BlobId) -> AppResult<Bytes> {
        let stream = self.read(id).await?;
        collect_stream(stream).await
    }
}

/// Drain a byte stream into a single buffer.
pub async fn collect_stream(mut stream: ByteStream) -> AppResult<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
