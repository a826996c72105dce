//! MOVE method implementation (RFC 4918 Section 9.9).

use http::{HeaderMap, Response, StatusCode};
use tracing;

use graphfs_core::AppResult;
use graphfs_graph::{RequestContext, TransactionMode};

use crate::body::{self, DavBody};
use crate::handler::DavHandler;
use crate::methods::Relocation;

/// Handle a MOVE request.
pub async fn handle_move(
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
            vfs.move_resource(ctx, path, &destination, overwrite)
        })
        .await?;

    tracing::info!(
        "Moved via WebDAV: user={}, from='{}', to='{}'",
        ctx.principal(),
        path,
        destination
    );

    Ok(body::status(if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::NO_CONTENT
    }))
}
