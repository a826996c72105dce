//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so that an empty
//! configuration is valid.

pub mod directory;
pub mod graph;
pub mod logging;
pub mod server;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::directory::{DirectoryConfig, UserEntry, WorkspaceEntry};
pub use self::graph::GraphConfig;
pub use self::logging::LoggingConfig;
pub use self::server::ServerConfig;
pub use self::storage::BlobStoreConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// WebDAV server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Graph store, transaction log, and recovery settings.
    #[serde(default)]
    pub graph: GraphConfig,
    /// Blob store settings.
    #[serde(default)]
    pub blobs: BlobStoreConfig,
    /// Users and workspaces known to the platform.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `GRAPHFS`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GRAPHFS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Load configuration from a single explicit file (plus environment overrides).
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(true))
            .add_source(
                config::Environment::with_prefix("GRAPHFS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
