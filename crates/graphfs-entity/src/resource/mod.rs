//! Resource (collection, directory, file) entities.

pub mod model;
pub mod path;
pub mod status;

pub use model::{Resource, ResourceKind};
pub use status::{LifecycleStatus, PublicationMode};
