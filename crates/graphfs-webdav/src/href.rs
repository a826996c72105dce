//! Mapping between request URIs and VFS paths.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use graphfs_core::{AppError, AppResult};
use graphfs_entity::resource::path;

/// Characters escaped in a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The URL prefix under which the VFS root is served.
#[derive(Debug, Clone)]
pub struct DavPaths {
    base_path: String,
}

impl DavPaths {
    pub fn new(base_path: &str) -> Self {
        let trimmed = base_path.trim_end_matches('/');
        let base_path = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        Self { base_path }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// URL-decoded VFS path of a request path, or `None` when the request
    /// is outside the base path.
    pub fn vfs_path(&self, uri_path: &str) -> AppResult<Option<String>> {
        let rest = match uri_path.strip_prefix(self.base_path.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return Ok(None),
        };
        let decoded = percent_decode_str(rest)
            .decode_utf8()
            .map_err(|_| AppError::validation("Request path is not valid UTF-8"))?;
        Ok(Some(path::normalize(&decoded)))
    }

    /// Encoded href of a VFS path; containers get a trailing slash.
    pub fn href(&self, vfs_path: &str, container: bool) -> String {
        let encoded = vfs_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        let mut href = format!("{}/{}", self.base_path, encoded);
        if container && !encoded.is_empty() {
            href.push('/');
        }
        href
    }

    /// VFS path named by a `Destination` header, given either as an
    /// absolute URI or as an absolute path.
    pub fn destination(&self, header: &str) -> AppResult<String> {
        let uri: http::Uri = header
            .parse()
            .map_err(|_| AppError::validation(format!("Malformed Destination header: {header}")))?;
        self.vfs_path(uri.path())?.ok_or_else(|| {
            AppError::validation(format!("Destination is outside {}", self.base_path))
        })
    }
}
