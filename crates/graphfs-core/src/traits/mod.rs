//! Core trait definitions.

pub mod blob;

pub use blob::{BlobInfo, BlobStore, ByteStream, collect_stream};
