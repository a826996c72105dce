//! Integration tests for durability: state written through the WebDAV
//! handler must survive a restart.

mod helpers;

use std::path::Path;
use std::sync::Arc;

use http::StatusCode;
use tempfile::TempDir;

use graphfs_core::config::GraphConfig;
use graphfs_core::traits::BlobStore;
use graphfs_graph::TransactionManager;
use graphfs_storage::LocalBlobStore;

use helpers::TestApp;

fn graph_config(root: &Path) -> GraphConfig {
    GraphConfig {
        dataset_path: root.join("dataset").to_string_lossy().into_owned(),
        transaction_log_path: root.join("txlog").to_string_lossy().into_owned(),
        fsync: false,
        ..GraphConfig::default()
    }
}

/// Recover the graph from disk and mount it over the blobs under `root`.
async fn open_app(root: &Path) -> TestApp {
    let manager = TransactionManager::open(&graph_config(root))
        .await
        .expect("Failed to open graph");
    let blobs: Arc<dyn BlobStore> = Arc::new(
        LocalBlobStore::new(root.join("blobs"))
            .await
            .expect("Failed to open blob store"),
    );
    TestApp::with_parts(manager, blobs).await
}

#[tokio::test]
async fn test_files_survive_restart() {
    let dir = TempDir::new().unwrap();

    {
        let app = open_app(dir.path()).await;
        assert_eq!(app.mkcol("/docs", "alice").await, StatusCode::CREATED);
        assert_eq!(
            app.put("/docs/notes.txt", "alice", "first draft").await.status,
            StatusCode::CREATED
        );
        assert_eq!(
            app.put("/docs/notes.txt", "alice", "second draft").await.status,
            StatusCode::NO_CONTENT
        );
    }

    let app = open_app(dir.path()).await;
    let get = app.get("/docs/notes.txt", "alice").await;
    assert_eq!(get.status, StatusCode::OK);
    assert_eq!(get.text(), "second draft");

    // Access control is part of the recovered graph too.
    assert_eq!(
        app.get("/docs/notes.txt", "carol").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_checkpoint_then_more_writes() {
    let dir = TempDir::new().unwrap();

    {
        let app = open_app(dir.path()).await;
        assert_eq!(app.mkcol("/docs", "alice").await, StatusCode::CREATED);
        app.put("/docs/before.txt", "alice", "before").await;

        let seq = app.manager.checkpoint().await.expect("Checkpoint failed");
        assert_eq!(seq, app.manager.last_seq());

        app.put("/docs/after.txt", "alice", "after").await;
        assert!(app.manager.last_seq() > seq);
    }

    let app = open_app(dir.path()).await;
    assert_eq!(app.get("/docs/before.txt", "alice").await.text(), "before");
    assert_eq!(app.get("/docs/after.txt", "alice").await.text(), "after");

    let listing = app.propfind("/docs", "alice", "1").await;
    assert_eq!(listing.status, StatusCode::MULTI_STATUS);
    let body = listing.text();
    assert!(body.contains("before.txt"));
    assert!(body.contains("after.txt"));
}

#[tokio::test]
async fn test_deleted_resource_stays_deleted() {
    let dir = TempDir::new().unwrap();

    {
        let app = open_app(dir.path()).await;
        assert_eq!(app.mkcol("/docs", "alice").await, StatusCode::CREATED);
        app.put("/docs/gone.txt", "alice", "temporary").await;
        let delete = app
            .request("DELETE", "/docs/gone.txt", Some("alice"), &[], "")
            .await;
        assert_eq!(delete.status, StatusCode::NO_CONTENT);
    }

    let app = open_app(dir.path()).await;
    assert_eq!(
        app.get("/docs/gone.txt", "alice").await.status,
        StatusCode::NOT_FOUND
    );

    let shown = app
        .request(
            "PROPFIND",
            "/docs/gone.txt",
            Some("alice"),
            &[("Depth", "0"), ("Show-Deleted", "on")],
            "",
        )
        .await;
    assert_eq!(shown.status, StatusCode::MULTI_STATUS);
    assert!(shown.text().contains("dateDeleted"));
}

#[tokio::test]
async fn test_aborted_write_is_not_replayed() {
    let dir = TempDir::new().unwrap();

    let seq = {
        let app = open_app(dir.path()).await;
        assert_eq!(app.mkcol("/docs", "alice").await, StatusCode::CREATED);
        let seq = app.manager.last_seq();
        assert_eq!(
            app.put("/missing/a.txt", "alice", "orphan").await.status,
            StatusCode::CONFLICT
        );
        assert_eq!(app.manager.last_seq(), seq);
        seq
    };

    let app = open_app(dir.path()).await;
    assert_eq!(app.manager.last_seq(), seq);
    assert_eq!(
        app.propfind("/missing", "alice", "0").await.status,
        StatusCode::NOT_FOUND
    );
}
