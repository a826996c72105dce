//! WebDAV server configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration for the file-protocol surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// HTTP Basic auth realm string.
    #[serde(default = "default_realm")]
    pub auth_realm: String,
    /// URL prefix under which the VFS root is served.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Maximum accepted upload size in bytes (default 5 GB).
    #[serde(default = "default_max_body")]
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_realm: default_realm(),
            base_path: default_base_path(),
            max_body_bytes: default_max_body(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_realm() -> String {
    "GraphFS".to_string()
}

fn default_base_path() -> String {
    "/api/webdav".to_string()
}

fn default_max_body() -> u64 {
    5_368_709_120 // 5 GB
}
