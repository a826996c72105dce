//! Graph store and transaction log configuration.

use serde::{Deserialize, Serialize};

/// Settings for the graph store, its write-ahead log, and recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base IRI for resource subjects.
    #[serde(default = "default_base_iri")]
    pub base_iri: String,
    /// Directory holding the graph checkpoint.
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
    /// Directory holding the append-only transaction log.
    #[serde(default = "default_log_path")]
    pub transaction_log_path: String,
    /// Whether committed write transactions are logged.
    #[serde(default = "default_true")]
    pub wal_enabled: bool,
    /// Whether each log append is synced to disk before commit returns.
    #[serde(default = "default_true")]
    pub fsync: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_iri: default_base_iri(),
            dataset_path: default_dataset_path(),
            transaction_log_path: default_log_path(),
            wal_enabled: true,
            fsync: true,
        }
    }
}

fn default_base_iri() -> String {
    "http://localhost/iri/".to_string()
}

fn default_dataset_path() -> String {
    "data/db".to_string()
}

fn default_log_path() -> String {
    "data/log".to_string()
}

fn default_true() -> bool {
    true
}
