//! Response bodies and the error → status mapping.

use bytes::Bytes;
use futures::TryStreamExt;
use http::{Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;

use graphfs_core::traits::ByteStream;
use graphfs_core::{AppError, AppResult, ErrorKind};

/// Body of every adapter response: buffered for XML and errors, streamed
/// from the blob store for content.
pub type DavBody = UnsyncBoxBody<Bytes, std::io::Error>;

pub fn empty() -> DavBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn full(data: impl Into<Bytes>) -> DavBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream blob content as the response body.
pub fn stream(content: ByteStream) -> DavBody {
    StreamBody::new(content.map_ok(Frame::data)).boxed_unsync()
}

/// Finish a response, reporting builder failures as internal errors.
pub fn build(builder: http::response::Builder, body: DavBody) -> AppResult<Response<DavBody>> {
    builder
        .body(body)
        .map_err(|e| AppError::internal(format!("Failed to build response: {e}")))
}

/// Bare status response.
pub fn status(status: StatusCode) -> Response<DavBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

/// Plain-text response.
pub fn text(status: StatusCode, message: impl Into<String>) -> Response<DavBody> {
    let message = message.into();
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full(message.clone()))
        .unwrap_or_else(|_| {
            let mut r = Response::new(full(message));
            *r.status_mut() = status;
            r
        })
}

/// Multistatus or other XML response.
pub fn xml(status: StatusCode, document: String) -> AppResult<Response<DavBody>> {
    build(
        Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/xml; charset=utf-8"),
        full(document),
    )
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Validation | ErrorKind::Serialization => StatusCode::BAD_REQUEST,
        ErrorKind::TransactionState
        | ErrorKind::Storage
        | ErrorKind::Configuration
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing outcome of an error. Server faults do not leak details.
pub fn error_response(error: &AppError, realm: &str) -> Response<DavBody> {
    let code = status_for(error.kind);
    if code.is_server_error() {
        return text(code, "Internal Server Error");
    }
    let mut response = text(code, error.message.clone());
    if code == StatusCode::UNAUTHORIZED {
        if let Ok(value) = http::HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")) {
            response
                .headers_mut()
                .insert(http::header::WWW_AUTHENTICATE, value);
        }
    }
    response
}
