//! DELETE method implementation (RFC 4918 Section 9.6).

use http::{Response, StatusCode};
use tracing;

use graphfs_core::{AppError, AppResult};
use graphfs_graph::{RequestContext, TransactionMode};

use crate::body::{self, DavBody};
use crate::handler::DavHandler;

/// Handle a DELETE request: tombstone the resource and its subtree.
pub async fn handle_delete(
    handler: &DavHandler,
    ctx: &mut RequestContext,
    path: &str,
) -> AppResult<Response<DavBody>> {
    if path.is_empty() {
        return Err(AppError::authorization("The root cannot be deleted"));
    }

    let removed = handler
        .in_transaction(ctx, TransactionMode::Write, |vfs, ctx| vfs.delete(ctx, path))
        .await?;

    tracing::debug!("DELETE: user={}, path='{}', removed={}", ctx.principal(), path, removed);
    Ok(body::status(StatusCode::NO_CONTENT))
}
