//! WebDAV request handler: authentication, transaction scoping, and method
//! dispatch.

use std::sync::Arc;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, BodyStream, LengthLimitError, Limited};
use hyper::body::Body;
use tracing::{debug, warn};

use graphfs_auth::UserDirectory;
use graphfs_core::config::ServerConfig;
use graphfs_core::traits::{BlobStore, ByteStream};
use graphfs_core::types::PrincipalId;
use graphfs_core::{AppError, AppResult};
use graphfs_graph::{RequestContext, TransactionManager, TransactionMode, ViewOptions};
use graphfs_vfs::Vfs;

use crate::auth::extract_basic_credentials;
use crate::body::{self, DavBody};
use crate::href::DavPaths;
use crate::methods;

/// Ceiling for XML request bodies (PROPFIND, PROPPATCH).
const XML_BODY_LIMIT: usize = 1024 * 1024;

/// Verbs advertised by OPTIONS.
const ALLOWED_METHODS: &str = "OPTIONS, PROPFIND, PROPPATCH, MKCOL, GET, HEAD, PUT, DELETE, COPY, MOVE";

/// Request header enabling the show-deleted view.
pub const SHOW_DELETED_HEADER: &str = "Show-Deleted";

/// Shared state of the WebDAV surface.
#[derive(Debug, Clone)]
pub struct DavHandler {
    /// Transaction manager of the graph
    manager: Arc<TransactionManager>,
    /// Virtual file system
    vfs: Vfs,
    /// Blob store holding file content
    blobs: Arc<dyn BlobStore>,
    /// User directory for authentication
    directory: Arc<UserDirectory>,
    /// URL prefix of the VFS root
    paths: DavPaths,
    /// Auth realm for Basic auth
    auth_realm: String,
    /// Upload size ceiling
    max_body_bytes: u64,
}

impl DavHandler {
    pub fn new(
        manager: Arc<TransactionManager>,
        vfs: Vfs,
        blobs: Arc<dyn BlobStore>,
        directory: Arc<UserDirectory>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            manager,
            vfs,
            blobs,
            directory,
            paths: DavPaths::new(&config.base_path),
            auth_realm: config.auth_realm.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn paths(&self) -> &DavPaths {
        &self.paths
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    /// Handle a WebDAV request.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<DavBody>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = match self.paths.vfs_path(req.uri().path()) {
            Ok(Some(path)) => path,
            Ok(None) => {
                return body::text(
                    StatusCode::NOT_FOUND,
                    format!("WebDAV is served under {}/", self.paths.base_path()),
                );
            }
            Err(e) => return body::error_response(&e, &self.auth_realm),
        };

        let method = req.method().clone();
        if method == Method::OPTIONS {
            return Self::handle_options();
        }

        let principal = match self.authenticate(req.headers()).await {
            Ok(principal) => principal,
            Err(e) => return body::error_response(&e, &self.auth_realm),
        };
        let view = ViewOptions {
            show_deleted: show_deleted(req.headers()),
        };
        let mut ctx = RequestContext::new(principal).with_view(view);

        debug!(%method, path = %path, principal = %ctx.principal(), "WebDAV request");

        let result = match method.as_str() {
            "PROPFIND" => methods::handle_propfind(self, &mut ctx, &path, req).await,
            "PROPPATCH" => methods::handle_proppatch(self, &mut ctx, &path, req).await,
            "MKCOL" => methods::handle_mkcol(self, &mut ctx, &path, req).await,
            "GET" => methods::handle_get(self, &mut ctx, &path).await,
            "HEAD" => methods::handle_head(self, &mut ctx, &path).await,
            "PUT" => methods::handle_put(self, &mut ctx, &path, req).await,
            "DELETE" => methods::handle_delete(self, &mut ctx, &path).await,
            "COPY" => methods::handle_copy(self, &mut ctx, &path, req.headers()).await,
            "MOVE" => methods::handle_move(self, &mut ctx, &path, req.headers()).await,
            _ => Ok(Self::method_not_allowed(&method)),
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                self.abort_open(&mut ctx).await;
                debug!(%method, path = %path, error = %e, "WebDAV request failed");
                body::error_response(&e, &self.auth_realm)
            }
        }
    }

    /// Run `op` inside a transaction of `mode`: commit on success, abort on
    /// failure. The lock is released when this returns.
    pub(crate) async fn in_transaction<T>(
        &self,
        ctx: &mut RequestContext,
        mode: TransactionMode,
        op: impl FnOnce(&Vfs, &mut RequestContext) -> AppResult<T>,
    ) -> AppResult<T> {
        self.manager.begin(ctx, mode).await?;
        match op(&self.vfs, ctx) {
            Ok(value) => {
                self.manager.commit(ctx).await?;
                Ok(value)
            }
            Err(e) => {
                self.abort_open(ctx).await;
                Err(e)
            }
        }
    }

    /// Abort the request's transaction if one is still open.
    async fn abort_open(&self, ctx: &mut RequestContext) {
        if ctx.active_mode().is_none() {
            return;
        }
        if let Err(e) = self.manager.abort(ctx).await {
            warn!(principal = %ctx.principal(), error = %e, "Failed to abort transaction");
        }
    }

    /// Authenticate a request using Basic auth. Password verification runs
    /// on the blocking pool.
    async fn authenticate(&self, headers: &HeaderMap) -> AppResult<PrincipalId> {
        let creds = extract_basic_credentials(headers)?;
        let directory = Arc::clone(&self.directory);
        tokio::task::spawn_blocking(move || {
            directory.authenticate(&creds.username, &creds.password)
        })
        .await
        .map_err(|e| AppError::internal(format!("Authentication task failed: {e}")))?
    }

    /// Read a small XML request body completely.
    pub(crate) async fn read_xml_body<B>(&self, body: B) -> AppResult<String>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let collected = Limited::new(body, XML_BODY_LIMIT)
            .collect()
            .await
            .map_err(|e| AppError::validation(format!("Unreadable request body: {e}")))?;
        String::from_utf8(collected.to_bytes().to_vec())
            .map_err(|_| AppError::validation("Request body is not valid UTF-8"))
    }

    /// Turn an upload body into a blob-store stream, enforcing the size
    /// ceiling while the bytes flow.
    pub(crate) fn upload_stream<B>(&self, body: B) -> ByteStream
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limit = usize::try_from(self.max_body_bytes).unwrap_or(usize::MAX);
        BodyStream::new(Limited::new(body, limit))
            .try_filter_map(|frame| futures::future::ready(Ok(frame.into_data().ok())))
            .map_err(std::io::Error::other)
            .boxed()
    }

    /// Handle OPTIONS request
    fn handle_options() -> Response<DavBody> {
        Response::builder()
            .status(StatusCode::OK)
            .header(http::header::ALLOW, ALLOWED_METHODS)
            .header("DAV", "1")
            .header("MS-Author-Via", "DAV")
            .body(body::empty())
            .unwrap_or_else(|_| body::status(StatusCode::OK))
    }

    fn method_not_allowed(method: &Method) -> Response<DavBody> {
        let mut response = body::text(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Method {method} not allowed"),
        );
        response.headers_mut().insert(
            http::header::ALLOW,
            http::HeaderValue::from_static(ALLOWED_METHODS),
        );
        response
    }
}

/// Whether a blob-store failure was caused by an upload running past the
/// body limit set in [`DavHandler::upload_stream`].
pub(crate) fn exceeded_body_limit(error: &AppError) -> bool {
    error
        .source
        .as_deref()
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .and_then(|io| io.get_ref())
        .is_some_and(|inner| inner.is::<LengthLimitError>())
}

/// Whether the request asks for tombstoned resources to be shown.
fn show_deleted(headers: &HeaderMap) -> bool {
    headers
        .get(SHOW_DELETED_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("on"))
}
