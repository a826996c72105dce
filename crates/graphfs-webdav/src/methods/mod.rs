//! WebDAV method implementations.

pub mod copy;
pub mod delete;
pub mod get_put;
pub mod mkcol;
pub mod move_op;
pub mod propfind;
pub mod proppatch;

pub use copy::handle_copy;
pub use delete::handle_delete;
pub use get_put::{handle_get, handle_head, handle_put};
pub use mkcol::handle_mkcol;
pub use move_op::handle_move;
pub use propfind::handle_propfind;
pub use proppatch::handle_proppatch;

use http::HeaderMap;

use graphfs_core::{AppError, AppResult};

use crate::handler::DavHandler;

/// Source and destination of a COPY or MOVE.
#[derive(Debug)]
pub(crate) struct Relocation {
    pub destination: String,
    pub overwrite: bool,
}

impl Relocation {
    /// Read the `Destination` and `Overwrite` headers. Overwrite defaults to
    /// `T`.
    pub(crate) fn from_headers(
        handler: &DavHandler,
        source: &str,
        headers: &HeaderMap,
    ) -> AppResult<Self> {
        if source.is_empty() {
            return Err(AppError::authorization("The root cannot be moved or copied"));
        }
        let destination = headers
            .get("Destination")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::validation("Missing Destination header"))?;
        let destination = handler.paths().destination(destination)?;

        let overwrite = match headers.get("Overwrite").and_then(|v| v.to_str().ok()) {
            None => true,
            Some(v) if v.trim().eq_ignore_ascii_case("T") => true,
            Some(v) if v.trim().eq_ignore_ascii_case("F") => false,
            Some(v) => {
                return Err(AppError::validation(format!("Invalid Overwrite header: {v}")));
            }
        };

        Ok(Self {
            destination,
            overwrite,
        })
    }
}
