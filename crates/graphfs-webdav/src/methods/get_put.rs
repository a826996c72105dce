//! GET, HEAD, and PUT method implementations for WebDAV.
//!
//! Content never moves while a transaction is open: PUT stores the upload
//! before its write transaction begins, and GET opens the blob only after
//! its read transaction has committed.

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use hyper::body::Body;
use tracing;

use graphfs_core::traits::BlobInfo;
use graphfs_core::{AppError, AppResult, ErrorKind};
use graphfs_graph::{RequestContext, TransactionMode};
use graphfs_vfs::{ResourceInfo, Vfs};

use crate::body::{self, DavBody};
use crate::handler::{DavHandler, exceeded_body_limit};
use crate::properties::{content_type, format_http_date};

/// Handle a GET request (download file)
pub async fn handle_get(
    handler: &DavHandler,
    ctx: &mut RequestContext,
    path: &str,
) -> AppResult<Response<DavBody>> {
    let info = handler
        .in_transaction(ctx, TransactionMode::Read, |vfs, ctx| resolve(vfs, ctx, path))
        .await?;

    tracing::debug!("GET: user={}, path='{}'", ctx.principal(), path);

    if info.is_container() {
        return Ok(body::text(
            StatusCode::METHOD_NOT_ALLOWED,
            "Cannot GET a collection",
        ));
    }
    let blob = file_blob(&info)?;

    let content = handler.blobs().read(&blob.id).await.map_err(|e| {
        if e.is(ErrorKind::NotFound) {
            AppError::storage(format!("Content of '{path}' is missing from the blob store"))
        } else {
            e
        }
    })?;

    body::build(headers(&info), body::stream(content))
}

/// Handle a HEAD request (metadata only)
pub async fn handle_head(
    handler: &DavHandler,
    ctx: &mut RequestContext,
    path: &str,
) -> AppResult<Response<DavBody>> {
    let info = handler
        .in_transaction(ctx, TransactionMode::Read, |vfs, ctx| resolve(vfs, ctx, path))
        .await?;

    tracing::debug!("HEAD: user={}, path='{}'", ctx.principal(), path);
    body::build(headers(&info), body::empty())
}

/// Handle a PUT request (upload/overwrite file)
pub async fn handle_put<B>(
    handler: &DavHandler,
    ctx: &mut RequestContext,
    path: &str,
    req: Request<B>,
) -> AppResult<Response<DavBody>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(declared) = declared_length(&req) {
        if declared > handler.max_body_bytes() {
            return Ok(too_large(handler));
        }
    }

    let stream = handler.upload_stream(req.into_body());
    let blob: BlobInfo = match handler.blobs().store(stream).await {
        Ok(blob) => blob,
        Err(e) if exceeded_body_limit(&e) => {
            tracing::debug!("PUT: user={}, path='{}', upload over limit", ctx.principal(), path);
            return Ok(too_large(handler));
        }
        Err(e) => return Err(e),
    };

    tracing::debug!(
        "PUT: user={}, path='{}', size={}, blob={}",
        ctx.principal(),
        path,
        blob.size,
        blob.id
    );

    let outcome = handler
        .in_transaction(ctx, TransactionMode::Write, |vfs, ctx| {
            vfs.write(ctx, path, blob)
        })
        .await?;

    let status = if outcome.created {
        tracing::info!("Created file via WebDAV: path='{}'", path);
        StatusCode::CREATED
    } else {
        tracing::info!("Overwrote file via WebDAV: path='{}'", path);
        StatusCode::NO_CONTENT
    };

    let mut builder = Response::builder().status(status);
    if let Some(etag) = outcome.info.etag() {
        builder = builder.header(http::header::ETAG, etag);
    }
    body::build(builder, body::empty())
}

/// Describe the target of a GET or HEAD. Files require Read; containers
/// only need to be visible.
fn resolve(vfs: &Vfs, ctx: &mut RequestContext, path: &str) -> AppResult<ResourceInfo> {
    let info = vfs
        .stat(ctx, path)?
        .ok_or_else(|| AppError::not_found(format!("No such resource: {path}")))?;
    if info.is_container() {
        return Ok(info);
    }
    vfs.read(ctx, path)
}

fn file_blob(info: &ResourceInfo) -> AppResult<&BlobInfo> {
    info.blob
        .as_ref()
        .ok_or_else(|| AppError::internal(format!("File '{}' has no content reference", info.path)))
}

fn headers(info: &ResourceInfo) -> http::response::Builder {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, content_type(info));
    if !info.is_container() {
        builder = builder.header(http::header::CONTENT_LENGTH, info.size.to_string());
    }
    if let Some(modified) = &info.date_modified {
        builder = builder.header(http::header::LAST_MODIFIED, format_http_date(modified));
    }
    if let Some(etag) = info.etag() {
        builder = builder.header(http::header::ETAG, etag);
    }
    builder
}

fn too_large(handler: &DavHandler) -> Response<DavBody> {
    body::text(
        StatusCode::PAYLOAD_TOO_LARGE,
        format!("Upload exceeds {} bytes", handler.max_body_bytes()),
    )
}

fn declared_length<B>(req: &Request<B>) -> Option<u64> {
    req.headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
