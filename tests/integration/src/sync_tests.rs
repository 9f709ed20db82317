//! End-to-end tests: watcher and dispatcher against a real HTTP server
//!
//! Each test binds a server to an ephemeral local port and drives the client
//! side through the same code paths `dirsync client` uses.

use std::net::SocketAddr;

use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

use dirsync_client::{
    ClientStore, HttpRemote, Outcome, RemoteStatus, SyncDispatcher, SyncRemote, run_with,
};
use dirsync_core::{ChangeEvent, ClientConfig, DeleteRequest, ItemKind, NormalizedPath};
use dirsync_fs::compute_bytes_checksum;
use dirsync_server::{SyncService, serve_with_shutdown};
use dirsync_test_utils::TestTree;

/// A server over a fresh temporary root.
struct TestServer {
    tree: TestTree,
    service: SyncService,
    addr: SocketAddr,
}

impl TestServer {
    async fn start() -> Self {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_with_shutdown(listener, service.clone(), std::future::pending()));
        Self { tree, service, addr }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn remote(&self) -> HttpRemote {
        HttpRemote::new(&self.url())
    }

    fn config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.url(),
            interval_secs: 0,
            ..ClientConfig::default()
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn identical_files_are_deduplicated() {
    let server = TestServer::start().await;
    let client = TestTree::new();
    client.write("a.txt", "abc123").write("b.txt", "abc123");
    let dispatcher = SyncDispatcher::new(client.root(), server.remote(), ClientStore::in_memory());
    let hash = compute_bytes_checksum(b"abc123");

    assert!(!server.remote().exists(&hash).await.unwrap());
    let first = dispatcher.handle(&ChangeEvent::CreatedFile(client.path("a.txt"))).await.unwrap();
    assert!(server.remote().exists(&hash).await.unwrap());
    let second = dispatcher.handle(&ChangeEvent::CreatedFile(client.path("b.txt"))).await.unwrap();

    assert_eq!((first, second), (Outcome::Synced, Outcome::Synced));
    assert_eq!(server.tree.read("a.txt"), server.tree.read("b.txt"));
    assert_eq!(
        server.service.index().lookup(&hash).unwrap(),
        Some(NormalizedPath::new("a.txt"))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_unknown_path_is_accepted() {
    let server = TestServer::start().await;

    let status = server
        .remote()
        .delete(&NormalizedPath::new("a.txt"), DeleteRequest::new(ItemKind::File))
        .await
        .unwrap();

    assert_eq!(status, RemoteStatus::Accepted);
}

#[tokio::test(flavor = "multi_thread")]
async fn paths_with_reserved_characters_round_trip() {
    let server = TestServer::start().await;
    let client = TestTree::new();
    client.write("my docs/report #1.txt", "content");
    let dispatcher = SyncDispatcher::new(client.root(), server.remote(), ClientStore::in_memory());

    dispatcher
        .handle(&ChangeEvent::CreatedFolder(client.path("my docs")))
        .await
        .unwrap();
    let outcome = dispatcher
        .handle(&ChangeEvent::CreatedFile(client.path("my docs/report #1.txt")))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Synced);
    server.tree.assert_file_contains("my docs/report #1.txt", "content");
}

#[tokio::test(flavor = "multi_thread")]
async fn client_run_mirrors_tree_and_later_changes() {
    let server = TestServer::start().await;
    let client = TestTree::new();
    client
        .write("docs/a.txt", "alpha")
        .write("docs/nested/b.txt", "beta")
        .write("top.txt", "top")
        .set_mtime("top.txt", 1_000.0);
    let store = ClientStore::in_memory();
    let config = server.config();

    // Nothing recorded yet, so the first scan reports every entry as created.
    let dispatcher = SyncDispatcher::new(client.root(), server.remote(), store.clone());
    run_with(client.root(), &config, dispatcher, Some(1)).await.unwrap();

    server.tree.assert_file_contains("docs/a.txt", "alpha");
    server.tree.assert_file_contains("docs/nested/b.txt", "beta");
    assert_eq!(server.tree.mtime("top.txt"), 1_000.0);
    assert!(store.files().unwrap().iter().all(|r| r.synced));
    assert_eq!(store.folders().unwrap().len(), 2);

    // A restarted client diffs against what it recorded.
    client.remove("docs/nested");
    client.write("top.txt", "top v2").set_mtime("top.txt", 2_000.0);

    let dispatcher = SyncDispatcher::new(client.root(), server.remote(), store.clone());
    run_with(client.root(), &config, dispatcher, Some(1)).await.unwrap();

    server.tree.assert_not_exists("docs/nested");
    server.tree.assert_file_contains("top.txt", "top v2");
    server.tree.assert_file_contains("docs/a.txt", "alpha");
    let recorded: Vec<_> = store.files().unwrap().into_iter().map(|r| r.path).collect();
    assert_eq!(recorded, vec!["docs/a.txt".to_string(), "top.txt".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn file_replaced_by_empty_folder_reaches_server() {
    let server = TestServer::start().await;
    let client = TestTree::new();
    client.write("x", "was a file");
    let store = ClientStore::in_memory();
    let config = server.config();

    let dispatcher = SyncDispatcher::new(client.root(), server.remote(), store.clone());
    run_with(client.root(), &config, dispatcher, Some(1)).await.unwrap();
    server.tree.assert_file_contains("x", "was a file");

    client.remove("x").mkdir("x");
    let dispatcher = SyncDispatcher::new(client.root(), server.remote(), store.clone());
    run_with(client.root(), &config, dispatcher, Some(1)).await.unwrap();

    assert!(server.tree.path("x").is_dir());
    assert!(store.files().unwrap().is_empty());
    let folders: Vec<_> = store
        .folders()
        .unwrap()
        .into_iter()
        .map(|r| (r.path, r.synced))
        .collect();
    assert_eq!(folders, vec![("x".to_string(), true)]);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_state_directory_is_not_synced() {
    let server = TestServer::start().await;
    let client = TestTree::new();
    client.write(".dirsync/client.redb", "local state").write("a.txt", "a");
    let dispatcher = SyncDispatcher::new(client.root(), server.remote(), ClientStore::in_memory());

    run_with(client.root(), &server.config(), dispatcher, Some(1)).await.unwrap();

    server.tree.assert_exists("a.txt");
    server.tree.assert_not_exists(".dirsync");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = TestTree::new();
    client.write("a.txt", "a");
    let dispatcher = SyncDispatcher::new(
        client.root(),
        HttpRemote::new(&format!("http://{addr}")),
        ClientStore::in_memory(),
    );

    let err = dispatcher
        .handle(&ChangeEvent::CreatedFile(client.path("a.txt")))
        .await
        .unwrap_err();

    assert!(err.is_fatal());
}
