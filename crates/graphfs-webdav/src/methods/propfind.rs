//! PROPFIND method implementation (RFC 4918 Section 9.1).

use http::{Request, Response, StatusCode};
use tracing;

use graphfs_core::{AppError, AppResult};
use graphfs_graph::{RequestContext, TransactionMode};
use graphfs_vfs::ResourceInfo;

use crate::body::{self, DavBody};
use crate::handler::DavHandler;
use crate::properties::{DavEntry, Depth, build_multistatus_xml};

/// Handle a PROPFIND request.
///
/// Every known property is returned regardless of the request body. With
/// `Depth: 0` only the target is described; otherwise a container's
/// visible children follow it.
pub async fn handle_propfind<B>(
    handler: &DavHandler,
    ctx: &mut RequestContext,
    path: &str,
    req: Request<B>,
) -> AppResult<Response<DavBody>> {
    let depth = Depth::from_header(req.headers().get("Depth").and_then(|v| v.to_str().ok()));

    let infos: Vec<ResourceInfo> = handler
        .in_transaction(ctx, TransactionMode::Read, |vfs, ctx| {
            let target = vfs
                .stat(ctx, path)?
                .ok_or_else(|| AppError::not_found(format!("No such resource: {path}")))?;
            let mut infos = vec![target];
            if depth == Depth::One && infos[0].is_container() {
                infos.extend(vfs.list(ctx, path)?);
            }
            Ok(infos)
        })
        .await?;

    tracing::debug!(
        "PROPFIND: user={}, path='{}', depth={:?}, entries={}",
        ctx.principal(),
        path,
        depth,
        infos.len()
    );

    let entries: Vec<DavEntry<'_>> = infos
        .iter()
        .map(|info| DavEntry {
            href: handler.paths().href(&info.path, info.is_container()),
            info,
        })
        .collect();

    body::xml(StatusCode::MULTI_STATUS, build_multistatus_xml(&entries))
}
