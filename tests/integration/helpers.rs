//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};

use graphfs_auth::{PasswordHasher, UserDirectory};
use graphfs_core::config::{DirectoryConfig, ServerConfig, UserEntry, WorkspaceEntry};
use graphfs_core::traits::BlobStore;
use graphfs_graph::TransactionManager;
use graphfs_storage::MemoryBlobStore;
use graphfs_vfs::Vfs;
use graphfs_webdav::DavHandler;

/// Password shared by every test user.
pub const PASSWORD: &str = "correct horse";

/// Base path the handler is mounted under.
pub const BASE: &str = "/api/webdav";

/// Test application context
pub struct TestApp {
    /// The WebDAV handler under test
    pub handler: DavHandler,
    /// Transaction manager behind the handler
    pub manager: Arc<TransactionManager>,
    /// Blob store behind the handler
    pub blobs: Arc<dyn BlobStore>,
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Users alice, bob, carol (alice and bob share the workspace `lab`, bob
/// as manager) and the administrator root.
pub fn directory_config() -> DirectoryConfig {
    let hash = PasswordHasher::new()
        .hash_password(PASSWORD)
        .expect("Failed to hash test password");
    let user = |id: &str, admin: bool| UserEntry {
        id: id.to_string(),
        name: id.to_string(),
        password_hash: hash.clone(),
        admin,
        can_view_public_metadata: true,
        can_view_public_data: false,
    };
    DirectoryConfig {
        users: vec![
            user("alice", false),
            user("bob", false),
            user("carol", false),
            user("root", true),
        ],
        workspaces: vec![WorkspaceEntry {
            id: "lab".to_string(),
            name: "Lab".to_string(),
            members: vec!["alice".to_string()],
            managers: vec!["bob".to_string()],
        }],
    }
}

impl TestApp {
    /// A fresh in-memory graph and blob store.
    pub async fn new() -> Self {
        Self::with_parts(
            TransactionManager::in_memory(),
            Arc::new(MemoryBlobStore::new()),
        )
        .await
    }

    /// Assemble a handler over the given manager and blob store, syncing the
    /// test directory into the graph first.
    pub async fn with_parts(manager: TransactionManager, blobs: Arc<dyn BlobStore>) -> Self {
        let directory =
            UserDirectory::from_config(&directory_config()).expect("Failed to build directory");
        directory
            .sync_into(&manager)
            .await
            .expect("Failed to sync directory");

        let manager = Arc::new(manager);
        let config = ServerConfig {
            base_path: BASE.to_string(),
            max_body_bytes: 1024 * 1024,
            ..ServerConfig::default()
        };
        let handler = DavHandler::new(
            Arc::clone(&manager),
            Vfs::new("http://localhost/iri/", Default::default()),
            Arc::clone(&blobs),
            Arc::new(directory),
            &config,
        );

        Self {
            handler,
            manager,
            blobs,
        }
    }

    /// Send a request as `user` (or anonymously).
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        user: Option<&str>,
        headers: &[(&str, &str)],
        body: impl Into<Bytes>,
    ) -> TestResponse {
        let method = Method::from_bytes(method.as_bytes()).expect("Invalid method");
        let mut builder = Request::builder().method(method).uri(format!("{BASE}{path}"));
        if let Some(user) = user {
            let token = BASE64.encode(format!("{user}:{PASSWORD}"));
            builder = builder.header(http::header::AUTHORIZATION, format!("Basic {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Full::new(body.into()))
            .expect("Failed to build request");

        let response = self.handler.handle(request).await;
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    pub async fn mkcol(&self, path: &str, user: &str) -> StatusCode {
        self.request("MKCOL", path, Some(user), &[], Bytes::new())
            .await
            .status
    }

    pub async fn put(&self, path: &str, user: &str, content: &'static str) -> TestResponse {
        self.request("PUT", path, Some(user), &[], content).await
    }

    pub async fn get(&self, path: &str, user: &str) -> TestResponse {
        self.request("GET", path, Some(user), &[], Bytes::new()).await
    }

    pub async fn propfind(&self, path: &str, user: &str, depth: &str) -> TestResponse {
        self.request("PROPFIND", path, Some(user), &[("Depth", depth)], Bytes::new())
            .await
    }

    pub async fn proppatch(&self, path: &str, user: &str, inner: &str) -> TestResponse {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <D:propertyupdate xmlns:D=\"DAV:\" xmlns:g=\"http://graphfs.io/ontology#\">\
             {inner}</D:propertyupdate>"
        );
        self.request("PROPPATCH", path, Some(user), &[], body).await
    }
}
