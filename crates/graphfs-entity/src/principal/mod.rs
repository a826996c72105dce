//! Principal (user and workspace) entities.

pub mod model;

pub use model::{Capabilities, MembershipRole, Principal, PrincipalKind};
