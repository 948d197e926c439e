// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use pf_core::{JobId, PluginId};
use pf_wire::{Request, Response};
use tempfile::TempDir;
use tokio::net::UnixListener;

use super::*;

const T: Duration = Duration::from_secs(5);

/// Serve one connection: read a request, answer with `responses` in order.
fn serve_once(
    dir: &TempDir,
    responses: Vec<Response>,
) -> (DaemonClient, tokio::task::JoinHandle<Request>) {
    let socket = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = pf_wire::read_request(&mut stream, T).await.unwrap();
        for response in &responses {
            pf_wire::write_response(&mut stream, response, T).await.unwrap();
        }
        request
    });
    (DaemonClient::at(socket), handle)
}

#[tokio::test]
async fn missing_socket_is_daemon_not_running() {
    let dir = TempDir::new().unwrap();
    let client = DaemonClient::at(dir.path().join("daemon.sock"));
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ClientError::DaemonNotRunning), "got {:?}", err);
}

#[tokio::test]
async fn ping_expects_pong() {
    let dir = TempDir::new().unwrap();
    let (client, server) = serve_once(&dir, vec![Response::Pong]);
    client.ping().await.unwrap();
    assert_eq!(server.await.unwrap(), Request::Ping);
}

#[tokio::test]
async fn error_response_is_rejected_with_message() {
    let dir = TempDir::new().unwrap();
    let (client, _server) = serve_once(&dir, vec![Response::error("unknown plugin: p9")]);
    let err = client.list_plugins().await.unwrap_err();
    match err {
        ClientError::Rejected(message) => assert_eq!(message, "unknown plugin: p9"),
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn mismatched_response_is_unexpected() {
    let dir = TempDir::new().unwrap();
    let (client, _server) = serve_once(&dir, vec![Response::NoChanges]);
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ClientError::Unexpected(_)), "got {:?}", err);
}

#[tokio::test]
async fn submit_build_sends_absolute_archive_path() {
    let dir = TempDir::new().unwrap();
    let (client, server) = serve_once(
        &dir,
        vec![Response::BuildAccepted {
            job_id: JobId::from("bld-1"),
            plugin_id: PluginId::from("p1"),
        }],
    );
    let submitted = client
        .submit_build(&PluginId::from("p1"), Path::new("src.zip"), Some("ci".into()), true)
        .await
        .unwrap();
    assert_eq!(submitted, Submitted::Accepted { job_id: JobId::from("bld-1") });

    match server.await.unwrap() {
        Request::Build { plugin_id, archive, submitter, release } => {
            assert_eq!(plugin_id, "p1");
            assert!(archive.is_absolute());
            assert!(archive.ends_with("src.zip"));
            assert_eq!(submitter.as_deref(), Some("ci"));
            assert!(release);
        }
        other => panic!("expected Build, got {:?}", other),
    }
}

#[yare::parameterized(
    already_running = { Response::AlreadyRunning { plugin_id: PluginId::from("p1") }, Submitted::AlreadyRunning },
    no_changes      = { Response::NoChanges, Submitted::NoChanges },
)]
#[test_macro(tokio::test)]
async fn submit_build_maps_admissions(response: Response, expected: Submitted) {
    let dir = TempDir::new().unwrap();
    let (client, _server) = serve_once(&dir, vec![response]);
    let submitted =
        client.submit_build(&PluginId::from("p1"), Path::new("/a.zip"), None, false).await.unwrap();
    assert_eq!(submitted, expected);
}

#[tokio::test]
async fn follower_yields_lines_until_close() {
    let dir = TempDir::new().unwrap();
    let (client, server) = serve_once(
        &dir,
        vec![
            Response::Ok,
            Response::Line { text: "[BUILD] Starting build".into(), error: false },
            Response::Line { text: "[BUILD] error: oops".into(), error: true },
        ],
    );
    let mut follower = client.follow(&PluginId::from("p1")).await.unwrap();

    let first = follower.next_line().await.unwrap().unwrap();
    assert_eq!(first, FollowLine { text: "[BUILD] Starting build".into(), error: false });
    let second = follower.next_line().await.unwrap().unwrap();
    assert!(second.error);

    assert_eq!(server.await.unwrap(), Request::Follow { plugin_id: PluginId::from("p1") });
    assert!(follower.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn follow_without_ack_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (client, _server) = serve_once(&dir, vec![Response::error("no such plugin")]);
    let err = client.follow(&PluginId::from("p1")).await.err().unwrap();
    assert!(matches!(err, ClientError::Rejected(_)));
}

#[tokio::test]
async fn artifact_path_asks_for_the_requested_profile() {
    let dir = TempDir::new().unwrap();
    let stored = std::path::PathBuf::from("/state/artifacts/abc-release.wasm");
    let (client, server) = serve_once(&dir, vec![Response::Artifact { path: stored.clone() }]);
    assert_eq!(client.artifact_path(&PluginId::from("p1"), true).await.unwrap(), stored);
    assert_eq!(
        server.await.unwrap(),
        Request::ArtifactGet { plugin_id: PluginId::from("p1"), release: true }
    );
}

#[tokio::test]
async fn last_log_returns_stored_text() {
    let dir = TempDir::new().unwrap();
    let logs = Response::Logs { plugin_id: PluginId::from("p1"), text: "compiling p1\n".into() };
    let (client, server) = serve_once(&dir, vec![logs]);
    assert_eq!(client.last_log(&PluginId::from("p1")).await.unwrap(), "compiling p1\n");
    assert_eq!(server.await.unwrap(), Request::LogsGet { plugin_id: PluginId::from("p1") });
}
