//! Integration tests for the ordering between payload I/O and transactions.

mod helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;

use graphfs_core::AppResult;
use graphfs_core::traits::{BlobInfo, BlobStore, ByteStream};
use graphfs_core::types::id::BlobId;
use graphfs_graph::{
    RequestContext, TransactionEvent, TransactionListener, TransactionManager, TransactionMode,
};
use graphfs_storage::MemoryBlobStore;

use helpers::TestApp;

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().expect("log poisoned").push(entry.into());
}

fn drain(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.lock().expect("log poisoned"))
}

#[derive(Debug)]
struct RecordingListener {
    log: Log,
}

impl TransactionListener for RecordingListener {
    fn on_event(&self, event: TransactionEvent) {
        push(&self.log, event.to_string());
    }
}

/// Memory store that records when content lands and when it is opened.
#[derive(Debug)]
struct RecordingBlobStore {
    inner: MemoryBlobStore,
    log: Log,
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    fn store_type(&self) -> &str {
        "recording"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn store(&self, stream: ByteStream) -> AppResult<BlobInfo> {
        let info = self.inner.store(stream).await?;
        push(&self.log, "stored");
        Ok(info)
    }

    async fn read(&self, id: &BlobId) -> AppResult<ByteStream> {
        push(&self.log, "read");
        self.inner.read(id).await
    }

    async fn exists(&self, id: &BlobId) -> AppResult<bool> {
        self.inner.exists(id).await
    }
}

async fn recording_app() -> (TestApp, Log) {
    let log: Log = Arc::default();
    let manager = TransactionManager::in_memory().with_listener(Arc::new(RecordingListener {
        log: Arc::clone(&log),
    }));
    let blobs = Arc::new(RecordingBlobStore {
        inner: MemoryBlobStore::new(),
        log: Arc::clone(&log),
    });
    let app = TestApp::with_parts(manager, blobs).await;
    drain(&log);
    (app, log)
}

fn event(e: TransactionEvent) -> String {
    e.to_string()
}

#[tokio::test]
async fn test_put_stores_payload_before_write_transaction() {
    let (app, log) = recording_app().await;
    assert_eq!(app.mkcol("/docs", "alice").await, StatusCode::CREATED);
    drain(&log);

    let put = app.put("/docs/a.txt", "alice", "payload").await;
    assert_eq!(put.status, StatusCode::CREATED);

    assert_eq!(
        drain(&log),
        vec![
            "stored".to_string(),
            event(TransactionEvent::Begin(TransactionMode::Write)),
            event(TransactionEvent::Commit(TransactionMode::Write)),
        ]
    );
}

#[tokio::test]
async fn test_get_reads_payload_after_read_transaction() {
    let (app, log) = recording_app().await;
    assert_eq!(app.mkcol("/docs", "alice").await, StatusCode::CREATED);
    app.put("/docs/a.txt", "alice", "payload").await;
    drain(&log);

    let get = app.get("/docs/a.txt", "alice").await;
    assert_eq!(get.status, StatusCode::OK);
    assert_eq!(get.text(), "payload");

    assert_eq!(
        drain(&log),
        vec![
            event(TransactionEvent::Begin(TransactionMode::Read)),
            event(TransactionEvent::Commit(TransactionMode::Read)),
            "read".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_failed_put_aborts_after_storing() {
    let (app, log) = recording_app().await;

    let put = app.put("/missing/a.txt", "alice", "payload").await;
    assert_eq!(put.status, StatusCode::CONFLICT);

    assert_eq!(
        drain(&log),
        vec![
            "stored".to_string(),
            event(TransactionEvent::Begin(TransactionMode::Write)),
            event(TransactionEvent::Abort(TransactionMode::Write)),
        ]
    );
}

#[tokio::test]
async fn test_denied_get_never_touches_payload() {
    let (app, log) = recording_app().await;
    assert_eq!(app.mkcol("/docs", "alice").await, StatusCode::CREATED);
    app.put("/docs/a.txt", "alice", "payload").await;
    drain(&log);

    let get = app.get("/docs/a.txt", "carol").await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);

    let entries = drain(&log);
    assert!(!entries.contains(&"read".to_string()));
    assert_eq!(
        entries.last(),
        Some(&event(TransactionEvent::Abort(TransactionMode::Read)))
    );
}

#[tokio::test]
async fn test_writer_waits_for_open_reader() {
    let manager = Arc::new(TransactionManager::in_memory());

    let mut reader = RequestContext::new("alice");
    manager
        .begin(&mut reader, TransactionMode::Read)
        .await
        .expect("Failed to begin read");

    // A second reader is admitted alongside the first.
    let mut second = RequestContext::new("bob");
    tokio::time::timeout(
        Duration::from_millis(200),
        manager.begin(&mut second, TransactionMode::Read),
    )
    .await
    .expect("Second reader blocked")
    .expect("Failed to begin second read");
    manager.commit(&mut second).await.expect("Failed to commit");

    let writer_manager = Arc::clone(&manager);
    let mut writer = tokio::spawn(async move {
        let mut ctx = RequestContext::new("carol");
        writer_manager.begin(&mut ctx, TransactionMode::Write).await?;
        writer_manager.commit(&mut ctx).await
    });

    let blocked = tokio::time::timeout(Duration::from_millis(100), &mut writer).await;
    assert!(blocked.is_err(), "Writer must wait for the open reader");

    manager.commit(&mut reader).await.expect("Failed to commit");
    tokio::time::timeout(Duration::from_secs(5), writer)
        .await
        .expect("Writer never acquired the lock")
        .expect("Writer task panicked")
        .expect("Writer transaction failed");
}
