//! Effective access resolution and operation-level checks.

pub mod checker;
pub mod resolver;
pub mod stages;

pub use checker::AccessChecker;
pub use resolver::PermissionResolver;
