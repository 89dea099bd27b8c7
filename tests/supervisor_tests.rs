// ABOUTME: Tests for the process supervisor using `sh` as a stand-in game server
// ABOUTME: Covers stdout events, stdin commands, exit codes, graceful stop, and spawn failures

#![cfg(unix)]

use whosin::config::MessagesConfig;
use whosin::detector::EventDispatcher;
use whosin::launch::LaunchSpec;
use whosin::outbox::{self, OutboxReceiver};
use std::time::{Duration, Instant};
use whosin::supervisor::ProcessSupervisor;

fn fake_server(script: &str) -> LaunchSpec {
    LaunchSpec::command("sh", ["-c", script], std::env::temp_dir())
}

async fn drain(mut rx: OutboxReceiver) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(text) = rx.recv().await {
        out.push(text);
    }
    out
}

#[tokio::test]
async fn test_stdout_events_are_forwarded_in_order() {
    let (notifications, rx) = outbox::channel();
    let dispatcher = EventDispatcher::new(MessagesConfig::default(), notifications);

    let server = ProcessSupervisor::new(fake_server(
        "printf '[T INFO] Starting Server\\r\\n[T INFO] Server started.\\r\\n[T INFO] Player conn'; \
         sleep 0.2; \
         printf 'ected: Eve, xuid: 1\\r\\n[T INFO] Player disconnected: Eve, xuid: 1\\r\\n'",
    ))
    .echo_output(false)
    .spawn(dispatcher)
    .unwrap();

    let status = server.wait().await.unwrap();
    assert!(status.success());

    assert_eq!(
        drain(rx).await,
        vec![
            "Minecraft server started!",
            "Eve join server.",
            "Eve leave server.",
        ]
    );
}

#[tokio::test]
async fn test_console_commands_reach_server_stdin() {
    let (notifications, rx) = outbox::channel();
    let dispatcher = EventDispatcher::new(MessagesConfig::default(), notifications);

    let server = ProcessSupervisor::new(fake_server(
        "read name; echo \"[T INFO] Player connected: $name, xuid: 9\"",
    ))
    .echo_output(false)
    .spawn(dispatcher)
    .unwrap();

    server.console().send("Zoe\n").await.unwrap();
    let status = server.wait().await.unwrap();
    assert!(status.success());

    assert_eq!(drain(rx).await, vec!["Zoe join server."]);
}

#[tokio::test]
async fn test_non_zero_exit_is_reported() {
    let (notifications, rx) = outbox::channel();
    let dispatcher = EventDispatcher::new(MessagesConfig::default(), notifications);

    let server = ProcessSupervisor::new(fake_server("echo 'fatal' >&2; exit 3"))
        .echo_output(false)
        .spawn(dispatcher)
        .unwrap();

    let status = server.wait().await.unwrap();
    assert_eq!(status.code(), Some(3));
    assert!(drain(rx).await.is_empty());
}

#[tokio::test]
async fn test_missing_executable_fails_to_spawn() {
    let (notifications, _rx) = outbox::channel();
    let dispatcher = EventDispatcher::new(MessagesConfig::default(), notifications);

    let launch = LaunchSpec::command(
        "/nonexistent/bedrock_server",
        Vec::<String>::new(),
        std::env::temp_dir(),
    );
    let result = ProcessSupervisor::new(launch).spawn(dispatcher);

    let err = result.err().expect("spawn should fail");
    assert!(err.to_string().contains("Failed to spawn server executable"));
}

#[tokio::test]
async fn test_stop_lets_server_finish_saving() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("saved");
    let (notifications, _rx) = outbox::channel();
    let dispatcher = EventDispatcher::new(MessagesConfig::default(), notifications);

    // Stand-in server: on `stop`, takes a moment to save, then exits cleanly
    let script = format!(
        "trap '' INT; read cmd; [ \"$cmd\" = stop ] || exit 9; sleep 0.3; echo saved > '{}'; exit 0",
        marker.display()
    );
    let server = ProcessSupervisor::new(fake_server(&script))
        .echo_output(false)
        .spawn(dispatcher)
        .unwrap();

    let status = server.stop(Duration::from_secs(5)).await.unwrap();

    assert!(status.success());
    assert!(marker.exists(), "server was killed before it finished saving");
}

#[tokio::test]
async fn test_stop_kills_server_after_grace_period() {
    let (notifications, _rx) = outbox::channel();
    let dispatcher = EventDispatcher::new(MessagesConfig::default(), notifications);

    let server = ProcessSupervisor::new(fake_server("exec sleep 30"))
        .echo_output(false)
        .spawn(dispatcher)
        .unwrap();

    let started = Instant::now();
    let status = server.stop(Duration::from_millis(200)).await.unwrap();

    assert!(!status.success());
    assert_eq!(status.code(), None);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_dropping_exited_future_leaves_server_running() {
    let (notifications, rx) = outbox::channel();
    let dispatcher = EventDispatcher::new(MessagesConfig::default(), notifications);

    let mut server = ProcessSupervisor::new(fake_server(
        "read name; echo \"[T INFO] Player connected: $name, xuid: 9\"",
    ))
    .echo_output(false)
    .spawn(dispatcher)
    .unwrap();

    let timed_out = tokio::time::timeout(Duration::from_millis(100), server.exited()).await;
    assert!(timed_out.is_err());

    server.console().send("Ada\n").await.unwrap();
    let status = server.wait().await.unwrap();
    assert!(status.success());
    assert_eq!(drain(rx).await, vec!["Ada join server."]);
}
