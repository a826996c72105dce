//! End-to-end tests of the WebDAV surface over an in-memory graph.

mod helpers;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::Full;

use helpers::TestApp;

const NO_BODY: Bytes = Bytes::new();

#[tokio::test]
async fn test_options_needs_no_credentials() {
    let app = TestApp::new().await;

    let response = app.request("OPTIONS", "/", None, &[], NO_BODY).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("DAV"), Some("1"));
    assert!(response.header("Allow").unwrap().contains("PROPPATCH"));
}

#[tokio::test]
async fn test_requests_require_valid_credentials() {
    let app = TestApp::new().await;

    let response = app.request("PROPFIND", "/", None, &[], NO_BODY).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.header("WWW-Authenticate"),
        Some("Basic realm=\"GraphFS\"")
    );

    let wrong = format!("Basic {}", BASE64.encode("alice:wrong"));
    let response = app
        .request("PROPFIND", "/", None, &[("Authorization", wrong.as_str())], NO_BODY)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let unknown = format!("Basic {}", BASE64.encode("mallory:correct horse"));
    let response = app
        .request("PROPFIND", "/", None, &[("Authorization", unknown.as_str())], NO_BODY)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_requests_outside_base_path() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("GET")
        .uri("/elsewhere/file.txt")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let response = app.handler.handle(request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collections_are_private_to_their_creator() {
    let app = TestApp::new().await;
    assert_eq!(app.mkcol("/projects", "alice").await, StatusCode::CREATED);
    assert_eq!(app.mkcol("/my%20docs", "alice").await, StatusCode::CREATED);

    let listing = app.propfind("/", "alice", "1").await;
    assert_eq!(listing.status, StatusCode::MULTI_STATUS);
    let xml = listing.text();
    assert_eq!(xml.matches("<D:response>").count(), 3);
    assert!(xml.contains("<D:href>/api/webdav/projects/</D:href>"));
    assert!(xml.contains("<D:href>/api/webdav/my%20docs/</D:href>"));
    assert!(xml.contains("<g:access>manage</g:access>"));

    let listing = app.propfind("/", "carol", "1").await;
    assert_eq!(listing.status, StatusCode::MULTI_STATUS);
    assert_eq!(listing.text().matches("<D:response>").count(), 1);

    let response = app.propfind("/projects", "carol", "0").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_depth_zero_describes_only_the_target() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;

    let response = app.propfind("/", "alice", "0").await;

    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    assert_eq!(response.text().matches("<D:response>").count(), 1);
    assert!(response.text().contains("<D:collection/>"));
}

#[tokio::test]
async fn test_mkcol_rules() {
    let app = TestApp::new().await;
    assert_eq!(app.mkcol("/projects", "alice").await, StatusCode::CREATED);
    assert_eq!(app.mkcol("/projects", "alice").await, StatusCode::CONFLICT);
    assert_eq!(app.mkcol("/projects/sub", "alice").await, StatusCode::CREATED);
    assert_eq!(app.mkcol("/projects/a/b", "alice").await, StatusCode::CONFLICT);

    let response = app
        .request("MKCOL", "/other", Some("alice"), &[], "<D:mkcol/>")
        .await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let listing = app.propfind("/projects", "alice", "1").await.text();
    assert!(listing.contains("<g:type>Directory</g:type>"));
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;

    let created = app.put("/projects/notes.txt", "alice", "first draft").await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert!(created.header("ETag").is_some());

    let replaced = app.put("/projects/notes.txt", "alice", "second draft!").await;
    assert_eq!(replaced.status, StatusCode::NO_CONTENT);
    assert!(replaced.header("ETag").is_some());

    let response = app.get("/projects/notes.txt", "alice").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"second draft!"));
    assert_eq!(response.header("Content-Length"), Some("13"));
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert!(response.header("Last-Modified").is_some());

    let head = app
        .request("HEAD", "/projects/notes.txt", Some("alice"), &[], NO_BODY)
        .await;
    assert_eq!(head.status, StatusCode::OK);
    assert_eq!(head.header("Content-Length"), Some("13"));
    assert!(head.body.is_empty());

    let listing = app.propfind("/projects", "alice", "1").await.text();
    assert!(listing.contains("<D:getcontentlength>13</D:getcontentlength>"));
    assert!(listing.contains("<g:checksum>"));
}

#[tokio::test]
async fn test_put_rules() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;

    assert_eq!(
        app.put("/loose.txt", "alice", "x").await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.put("/projects/missing/x.txt", "alice", "x").await.status,
        StatusCode::CONFLICT
    );
    assert_eq!(
        app.put("/projects", "alice", "x").await.status,
        StatusCode::CONFLICT
    );

    let response = app
        .request(
            "PUT",
            "/projects/huge.bin",
            Some("alice"),
            &[("Content-Length", "2000000")],
            "tiny",
        )
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_put_without_length_over_limit() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;

    let oversized = vec![b'x'; 2 * 1024 * 1024];
    let response = app
        .request("PUT", "/projects/huge.bin", Some("alice"), &[], oversized)
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);

    assert_eq!(
        app.get("/projects/huge.bin", "alice").await.status,
        StatusCode::NOT_FOUND
    );

    let fits = app.put("/projects/small.bin", "alice", "fits").await;
    assert_eq!(fits.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_get_and_head_on_containers() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;

    assert_eq!(
        app.get("/projects", "alice").await.status,
        StatusCode::METHOD_NOT_ALLOWED
    );

    let head = app
        .request("HEAD", "/projects/", Some("alice"), &[], NO_BODY)
        .await;
    assert_eq!(head.status, StatusCode::OK);
    assert_eq!(head.header("Content-Type"), Some("httpd/unix-directory"));
}

#[tokio::test]
async fn test_grants_through_proppatch() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;
    app.put("/projects/a.txt", "alice", "hello").await;

    assert_eq!(
        app.get("/projects/a.txt", "carol").await.status,
        StatusCode::NOT_FOUND
    );

    let response = app
        .proppatch(
            "/projects",
            "alice",
            "<D:set><D:prop><g:access principal=\"carol\">read</g:access></D:prop></D:set>",
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    assert!(response.text().contains("HTTP/1.1 200 OK"));

    assert_eq!(app.get("/projects/a.txt", "carol").await.status, StatusCode::OK);
    assert_eq!(
        app.put("/projects/b.txt", "carol", "nope").await.status,
        StatusCode::FORBIDDEN
    );
    let response = app
        .proppatch(
            "/projects/a.txt",
            "carol",
            "<D:set><D:prop><g:comment>mine</g:comment></D:prop></D:set>",
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Only managers hand out access.
    let response = app
        .proppatch(
            "/projects",
            "carol",
            "<D:set><D:prop><g:access principal=\"carol\">write</g:access></D:prop></D:set>",
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .proppatch(
            "/projects",
            "alice",
            "<D:remove><D:prop><g:access principal=\"carol\"/></D:prop></D:remove>",
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    assert_eq!(
        app.get("/projects/a.txt", "carol").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_published_metadata_is_listable() {
    let app = TestApp::new().await;
    app.mkcol("/open", "alice").await;
    app.put("/open/a.txt", "alice", "hello").await;

    let response = app
        .proppatch(
            "/open",
            "alice",
            "<D:set><D:prop><g:accessMode>MetadataPublished</g:accessMode></D:prop></D:set>",
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);

    let listing = app.propfind("/open", "carol", "1").await;
    assert_eq!(listing.status, StatusCode::MULTI_STATUS);
    assert!(listing.text().contains("a.txt"));
    assert!(listing.text().contains("<g:access>list</g:access>"));
    assert_eq!(
        app.get("/open/a.txt", "carol").await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_unknown_properties_fail_the_whole_patch() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;

    let response = app
        .proppatch(
            "/projects",
            "alice",
            "<D:set><D:prop><g:comment>kept?</g:comment>\
             <z:color xmlns:z=\"urn:z\">red</z:color></D:prop></D:set>",
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    let xml = response.text();
    assert!(xml.contains("HTTP/1.1 403 Forbidden"));
    assert!(xml.contains("HTTP/1.1 424 Failed Dependency"));

    let listing = app.propfind("/projects", "alice", "0").await.text();
    assert!(!listing.contains("kept?"));

    let response = app
        .proppatch(
            "/projects",
            "alice",
            "<D:set><D:prop><g:comment>kept</g:comment></D:prop></D:set>",
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    let listing = app.propfind("/projects", "alice", "0").await.text();
    assert!(listing.contains("<g:comment>kept</g:comment>"));
}

#[tokio::test]
async fn test_archived_collection_is_frozen_until_reactivated() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;
    app.put("/projects/a.txt", "alice", "v1").await;

    let archive = "<D:set><D:prop><g:status>Archived</g:status></D:prop></D:set>";
    assert_eq!(
        app.proppatch("/projects", "alice", archive).await.status,
        StatusCode::MULTI_STATUS
    );

    assert_eq!(
        app.put("/projects/a.txt", "alice", "v2").await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get("/projects/a.txt", "alice").await.status,
        StatusCode::FORBIDDEN
    );
    let listing = app.propfind("/projects", "alice", "0").await.text();
    assert!(listing.contains("<g:status>Archived</g:status>"));

    let reactivate = "<D:set><D:prop><g:status>Active</g:status></D:prop></D:set>";
    assert_eq!(
        app.proppatch("/projects", "alice", reactivate).await.status,
        StatusCode::MULTI_STATUS
    );
    assert_eq!(
        app.put("/projects/a.txt", "alice", "v2").await.status,
        StatusCode::NO_CONTENT
    );
}

#[tokio::test]
async fn test_status_is_only_set_on_collections() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;
    app.put("/projects/a.txt", "alice", "v1").await;

    let response = app
        .proppatch(
            "/projects/a.txt",
            "alice",
            "<D:set><D:prop><g:status>ReadOnly</g:status></D:prop></D:set>",
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .proppatch(
            "/projects",
            "alice",
            "<D:set><D:prop><g:status>Frozen</g:status></D:prop></D:set>",
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_show_deleted_and_restore() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;
    app.put("/projects/a.txt", "alice", "hello").await;
    app.put("/projects/b.txt", "alice", "world").await;

    let response = app
        .request("DELETE", "/projects/a.txt", Some("alice"), &[], NO_BODY)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get("/projects/a.txt", "alice").await.status,
        StatusCode::NOT_FOUND
    );

    let live = app.propfind("/projects", "alice", "1").await.text();
    assert!(!live.contains("a.txt"));
    assert!(live.contains("b.txt"));

    let deleted = app
        .request(
            "PROPFIND",
            "/projects",
            Some("alice"),
            &[("Depth", "1"), ("Show-Deleted", "on")],
            NO_BODY,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::MULTI_STATUS);
    let xml = deleted.text();
    assert!(xml.contains("a.txt"));
    assert!(xml.contains("<g:deletedBy>alice</g:deletedBy>"));
    assert!(xml.contains("<g:status>Deleted</g:status>"));

    let response = app
        .proppatch(
            "/projects/a.txt",
            "alice",
            "<D:remove><D:prop><g:dateDeleted/></D:prop></D:remove>",
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);
    assert!(response.text().contains("HTTP/1.1 200 OK"));

    let restored = app.get("/projects/a.txt", "alice").await;
    assert_eq!(restored.status, StatusCode::OK);
    assert_eq!(restored.body, Bytes::from_static(b"hello"));
}

#[tokio::test]
async fn test_deleted_collection_restores_with_its_content() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;
    app.mkcol("/projects/docs", "alice").await;
    app.put("/projects/docs/a.txt", "alice", "hello").await;

    let response = app
        .request("DELETE", "/projects", Some("alice"), &[], NO_BODY)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let root = app.propfind("/", "alice", "1").await.text();
    assert!(!root.contains("projects"));

    let response = app
        .proppatch(
            "/projects",
            "alice",
            "<D:remove><D:prop><g:dateDeleted/></D:prop></D:remove>",
        )
        .await;
    assert_eq!(response.status, StatusCode::MULTI_STATUS);

    let restored = app.get("/projects/docs/a.txt", "alice").await;
    assert_eq!(restored.status, StatusCode::OK);
    assert_eq!(restored.body, Bytes::from_static(b"hello"));
}

#[tokio::test]
async fn test_root_cannot_be_removed_or_relocated() {
    let app = TestApp::new().await;

    let response = app.request("DELETE", "/", Some("root"), &[], NO_BODY).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "MOVE",
            "/",
            Some("root"),
            &[("Destination", "/api/webdav/elsewhere")],
            NO_BODY,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_move_and_overwrite() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;
    app.put("/projects/a.txt", "alice", "alpha").await;
    app.put("/projects/b.txt", "alice", "beta").await;

    let response = app
        .request(
            "MOVE",
            "/projects/a.txt",
            Some("alice"),
            &[
                ("Destination", "http://localhost/api/webdav/projects/b.txt"),
                ("Overwrite", "F"),
            ],
            NO_BODY,
        )
        .await;
    assert_eq!(response.status, StatusCode::PRECONDITION_FAILED);

    let response = app
        .request(
            "MOVE",
            "/projects/a.txt",
            Some("alice"),
            &[("Destination", "http://localhost/api/webdav/projects/c.txt")],
            NO_BODY,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        app.get("/projects/a.txt", "alice").await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/projects/c.txt", "alice").await.body,
        Bytes::from_static(b"alpha")
    );

    let response = app
        .request(
            "MOVE",
            "/projects/c.txt",
            Some("alice"),
            &[("Destination", "/api/webdav/projects/b.txt")],
            NO_BODY,
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get("/projects/b.txt", "alice").await.body,
        Bytes::from_static(b"alpha")
    );

    let response = app
        .request("MOVE", "/projects/b.txt", Some("alice"), &[], NO_BODY)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_copy_collection() {
    let app = TestApp::new().await;
    app.mkcol("/projects", "alice").await;
    app.put("/projects/a.txt", "alice", "alpha").await;
    app.proppatch(
        "/projects",
        "alice",
        "<D:set><D:prop><g:access principal=\"carol\">read</g:access></D:prop></D:set>",
    )
    .await;

    let response = app
        .request(
            "COPY",
            "/projects",
            Some("carol"),
            &[("Destination", "/api/webdav/mine")],
            NO_BODY,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "COPY",
            "/projects",
            Some("alice"),
            &[("Destination", "/api/webdav/backup")],
            NO_BODY,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        app.get("/backup/a.txt", "alice").await.body,
        Bytes::from_static(b"alpha")
    );
    assert_eq!(
        app.get("/projects/a.txt", "alice").await.status,
        StatusCode::OK
    );

    let response = app
        .request(
            "COPY",
            "/projects/a.txt",
            Some("alice"),
            &[("Destination", "/api/webdav/a.txt")],
            NO_BODY,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = TestApp::new().await;

    let response = app.request("LOCK", "/", Some("alice"), &[], NO_BODY).await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.header("Allow").is_some());
}
