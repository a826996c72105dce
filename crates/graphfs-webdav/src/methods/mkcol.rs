//! MKCOL method implementation (RFC 4918 Section 9.3).

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use hyper::body::Body;
use tracing;

use graphfs_core::AppResult;
use graphfs_graph::{RequestContext, TransactionMode};

use crate::body::{self, DavBody};
use crate::handler::DavHandler;

/// Handle a MKCOL request.
///
/// A top-level MKCOL creates a collection, anything deeper a directory.
/// Request bodies are not supported.
pub async fn handle_mkcol<B>(
    handler: &DavHandler,
    ctx: &mut RequestContext,
    path: &str,
    req: Request<B>,
) -> AppResult<Response<DavBody>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = handler.read_xml_body(req.into_body()).await?;
    if !body.trim().is_empty() {
        return Ok(body::text(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "MKCOL request bodies are not supported",
        ));
    }

    let info = handler
        .in_transaction(ctx, TransactionMode::Write, |vfs, ctx| vfs.mkdir(ctx, path))
        .await?;

    tracing::debug!("MKCOL: user={}, path='{}', kind={:?}", ctx.principal(), path, info.kind);
    Ok(body::status(StatusCode::CREATED))
}
