//! Blob store providers.

pub mod local;
pub mod memory;
