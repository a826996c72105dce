//! COPY method implementation (RFC 4918 Section 9.8).

use http::{HeaderMap, Response, StatusCode};
use tracing;

use graphfs_core::AppResult;
use graphfs_graph::{RequestContext, TransactionMode};

use crate::body::{self, DavBody};
use crate::handler::DavHandler;
use crate::methods::Relocation;

/// Handle a COPY request. Copied files share their blobs with the source.
pub async fn handle_copy(
    handler: &DavHandler,
    ctx: &mut RequestContext,
    path: &str,
    headers: &HeaderMap,
) -> AppResult<Response<DavBody>> {
    let Relocation {
        destination,
        overwrite,
    } = Relocation::from_headers(handler, path, headers)?;

    let outcome = handler
        .in_transaction(ctx, TransactionMode::Write, |vfs, ctx| {
            vfs.copy(ctx, path, &destination, overwrite)
        })
        .await?;

    tracing::debug!(
        "COPY: user={}, from='{}', to='{}', created={}",
        ctx.principal(),
        path,
        destination,
        outcome.created
    );

    Ok(body::status(if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::NO_CONTENT
    }))
}
