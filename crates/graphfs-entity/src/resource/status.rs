//! Lifecycle and publication enumerations for collections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a collection.
///
/// `Deleted` is never stored: it is reported for tombstoned resources
/// (those carrying `date_deleted`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifecycleStatus {
    /// Normal operation.
    #[default]
    Active,
    /// Content is frozen; at most Read access.
    ReadOnly,
    /// Content is offline; at most List access.
    Archived,
    /// Tombstoned.
    Deleted,
}

impl LifecycleStatus {
    /// Return the status as stored in the graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::ReadOnly => "ReadOnly",
            Self::Archived => "Archived",
            Self::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = graphfs_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "readonly" => Ok(Self::ReadOnly),
            "archived" => Ok(Self::Archived),
            "deleted" => Ok(Self::Deleted),
            _ => Err(graphfs_core::AppError::validation(format!(
                "Invalid status: '{s}'. Expected one of: Active, ReadOnly, Archived"
            ))),
        }
    }
}

/// Publication mode of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PublicationMode {
    /// Visible only through grants.
    #[default]
    Private,
    /// Listable by principals allowed to view public metadata.
    MetadataPublished,
    /// Readable by principals allowed to view public data.
    DataPublished,
}

impl PublicationMode {
    /// Return the mode as stored in the graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "Private",
            Self::MetadataPublished => "MetadataPublished",
            Self::DataPublished => "DataPublished",
        }
    }

    /// Whether the collection's metadata is public in this mode.
    pub fn publishes_metadata(&self) -> bool {
        matches!(self, Self::MetadataPublished | Self::DataPublished)
    }

    /// Whether the collection's data is public in this mode.
    pub fn publishes_data(&self) -> bool {
        matches!(self, Self::DataPublished)
    }
}

impl fmt::Display for PublicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PublicationMode {
    type Err = graphfs_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "metadatapublished" => Ok(Self::MetadataPublished),
            "datapublished" => Ok(Self::DataPublished),
            _ => Err(graphfs_core::AppError::validation(format!(
                "Invalid access mode: '{s}'. Expected one of: Private, MetadataPublished, DataPublished"
            ))),
        }
    }
}
