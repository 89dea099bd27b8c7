// ABOUTME: Integration tests for console event detection across arbitrary chunk boundaries
// ABOUTME: Feeds realistic Bedrock server output through the dispatcher into a recording sink

use whosin::config::MessagesConfig;
use whosin::detector::{match_line, EventDispatcher, LineAccumulator, MatchedEvent, NotificationSink};

/// Output of a typical Bedrock server session, as written to stdout on Windows
const SESSION: &str = "NO LOG FILE! - setting up server logging...\r\n\
[2024-03-01 10:00:00:001 INFO] Starting Server\r\n\
[2024-03-01 10:00:00:002 INFO] Version 1.20.62.02\r\n\
[2024-03-01 10:00:02:500 INFO] Server started.\r\n\
[2024-03-01 10:05:10:100 INFO] Player connected: Alice, xuid: 2535412345678901\r\n\
[2024-03-01 10:06:00:000 INFO] Player connected: Bob the 2nd, xuid: 2535400000000002\r\n\
[2024-03-01 10:30:45:900 INFO] Player disconnected: Alice, xuid: 2535412345678901\r\n\
[2024-03-01 10:31:00:000 INFO] Running AutoCompaction...";

#[derive(Default)]
struct Recorder(Vec<String>);

impl NotificationSink for Recorder {
    fn forward(&mut self, text: String) -> anyhow::Result<()> {
        self.0.push(text);
        Ok(())
    }
}

fn expected_notifications() -> Vec<&'static str> {
    vec![
        "Minecraft server started!",
        "Alice join server.",
        "Bob the 2nd join server.",
        "Alice leave server.",
    ]
}

#[test]
fn test_session_in_one_chunk() {
    let mut dispatcher = EventDispatcher::new(MessagesConfig::default(), Recorder::default());
    dispatcher.on_chunk(SESSION);
    assert_eq!(dispatcher.sink().0, expected_notifications());
    assert_eq!(
        dispatcher.pending(),
        "[2024-03-01 10:31:00:000 INFO] Running AutoCompaction..."
    );
}

#[test]
fn test_session_byte_by_byte() {
    let mut dispatcher = EventDispatcher::new(MessagesConfig::default(), Recorder::default());
    for byte in SESSION.as_bytes() {
        dispatcher.on_chunk([*byte]);
    }
    assert_eq!(dispatcher.sink().0, expected_notifications());
}

#[test]
fn test_session_in_uneven_chunks() {
    for size in [2, 3, 7, 13, 64, 100, 1000] {
        let mut dispatcher =
            EventDispatcher::new(MessagesConfig::default(), Recorder::default());
        for chunk in SESSION.as_bytes().chunks(size) {
            dispatcher.on_chunk(chunk);
        }
        assert_eq!(dispatcher.sink().0, expected_notifications(), "chunk size {size}");
    }
}

#[test]
fn test_any_two_way_split_matches_whole_stream_split() {
    let whole: Vec<String> = {
        let mut pieces: Vec<String> = SESSION.split('\n').map(str::to_string).collect();
        pieces.pop();
        pieces
    };

    for at in 0..=SESSION.len() {
        let mut acc = LineAccumulator::new();
        let mut lines = acc.feed(&SESSION.as_bytes()[..at]);
        lines.extend(acc.feed(&SESSION.as_bytes()[at..]));
        assert_eq!(lines, whole, "split at {at}");
        assert_eq!(
            acc.pending(),
            "[2024-03-01 10:31:00:000 INFO] Running AutoCompaction..."
        );
    }
}

#[test]
fn test_documented_examples() {
    assert_eq!(
        match_line("[12:00:00 INFO] Server started.\r"),
        MatchedEvent::ServerReady
    );
    assert_eq!(
        match_line("[12:00:00 INFO] Player connected: Alice, xuid: 1234567890"),
        MatchedEvent::PlayerJoined {
            name: "Alice".to_string()
        }
    );
    assert_eq!(
        match_line("[12:00:00 INFO] Player disconnected: Bob_99, xuid: 42\r"),
        MatchedEvent::PlayerLeft {
            name: "Bob_99".to_string()
        }
    );
    assert_eq!(
        match_line("[12:00:00 INFO] Some other message"),
        MatchedEvent::Unmatched
    );
}

#[test]
fn test_join_split_mid_marker_fires_once() {
    let mut dispatcher = EventDispatcher::new(MessagesConfig::default(), Recorder::default());
    dispatcher.on_chunk("[X] Player conn");
    dispatcher.on_chunk("ected: Eve, xuid: 1\n");
    assert_eq!(dispatcher.sink().0, vec!["Eve join server."]);
}
