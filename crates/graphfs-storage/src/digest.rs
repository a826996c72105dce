//! Incremental content digests.

use sha2::{Digest, Sha256};

use graphfs_core::traits::BlobInfo;
use graphfs_core::types::BlobId;

/// Hashes content as it streams past, producing its address and checksum.
#[derive(Debug, Clone, Default)]
pub struct ContentDigest {
    address: blake3::Hasher,
    checksum: Sha256,
    size: u64,
}

impl ContentDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.address.update(chunk);
        self.checksum.update(chunk);
        self.size += chunk.len() as u64;
    }

    /// Bytes seen so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn finish(self) -> BlobInfo {
        BlobInfo {
            id: BlobId::new(self.address.finalize().to_hex().to_string()),
            size: self.size,
            checksum_sha256: hex::encode(self.checksum.finalize()),
        }
    }
}
