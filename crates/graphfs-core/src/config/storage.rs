//! Blob store configuration.

use serde::{Deserialize, Serialize};

/// Content-addressed blob store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// Root directory for stored blobs.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> String {
    "data/blobs".to_string()
}
