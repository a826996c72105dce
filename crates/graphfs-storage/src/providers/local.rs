//! Local filesystem blob store.
//!
//! Content is streamed to a temporary file under `tmp/`, hashed on the way,
//! then renamed to `<first two hex chars>/<address>`. Identical content is
//! stored once.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use graphfs_core::error::{AppError, ErrorKind};
use graphfs_core::result::AppResult;
use graphfs_core::traits::{BlobInfo, BlobStore, ByteStream};
use graphfs_core::types::BlobId;

use crate::digest::ContentDigest;

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new local blob store rooted at the given path.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(root.join("tmp")).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create blob store root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Location of a blob, rejecting addresses that are not plain hex.
    fn resolve(&self, id: &BlobId) -> AppResult<PathBuf> {
        let address = id.as_str();
        if address.len() < 3 || !address.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::validation(format!("Invalid blob id: {address}")));
        }
        Ok(self.root.join(&address[..2]).join(address))
    }

    async fn write_temp(&self, tmp: &Path, mut stream: ByteStream) -> AppResult<BlobInfo> {
        let mut file = fs::File::create(tmp).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create temporary blob: {}", tmp.display()),
                e,
            )
        })?;

        let mut digest = ContentDigest::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            digest.update(&chunk);
            file.write_all(&chunk).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to write chunk", e)
            })?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush blob", e))?;
        file.sync_all()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to sync blob", e))?;

        Ok(digest.finish())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn store_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.is_dir())
    }

    async fn store(&self, stream: ByteStream) -> AppResult<BlobInfo> {
        let tmp = self.root.join("tmp").join(Uuid::new_v4().to_string());

        let info = match self.write_temp(&tmp, stream).await {
            Ok(info) => info,
            Err(e) => {
                let _ = fs::remove_file(&tmp).await;
                return Err(e);
            }
        };

        let target = self.resolve(&info.id)?;
        if fs::try_exists(&target).await? {
            fs::remove_file(&tmp).await?;
            debug!(blob = %info.id, size = info.size, "Blob already stored");
            return Ok(info);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create blob directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        fs::rename(&tmp, &target).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to move blob into place: {}", info.id),
                e,
            )
        })?;

        debug!(blob = %info.id, size = info.size, "Stored blob");
        Ok(info)
    }

    async fn read(&self, id: &BlobId) -> AppResult<ByteStream> {
        let path = self.resolve(id)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {id}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to open blob: {id}"), e)
            }
        })?;

        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn exists(&self, id: &BlobId) -> AppResult<bool> {
        let path = self.resolve(id)?;
        Ok(fs::try_exists(&path).await?)
    }
}
