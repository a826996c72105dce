//! Access levels and the grant edges that carry them.

pub mod access;
pub mod grant;

pub use access::AccessLevel;
pub use grant::{GrantEdge, highest_level};
