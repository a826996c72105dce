//! # graphfs-auth
//!
//! Authentication and authorization for GraphFS.
//!
//! ## Modules
//!
//! - `acl`: effective access resolution over the graph and operation checks
//! - `password`: Argon2id password hashing and verification
//! - `directory`: config-backed user directory and principal sync

pub mod acl;
pub mod directory;
pub mod password;

pub use acl::{AccessChecker, PermissionResolver};
pub use directory::UserDirectory;
pub use password::PasswordHasher;
