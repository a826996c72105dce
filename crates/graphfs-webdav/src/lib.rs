//! WebDAV protocol adapter for GraphFS (a subset of RFC 4918).
//!
//! Translates WebDAV requests into VFS operations. The adapter owns the
//! ordering between payload I/O and transactions: uploads are stored in the
//! blob store before the write transaction begins, and downloads stream
//! from the blob store only after the read transaction has committed. It is
//! also the single place where internal errors become HTTP statuses.

pub mod auth;
pub mod body;
pub mod handler;
pub mod href;
pub mod methods;
pub mod properties;
pub mod server;

pub use body::DavBody;
pub use handler::DavHandler;
pub use server::WebDavServer;
